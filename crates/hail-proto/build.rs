fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_file = "../../proto/hail/v1/hail.proto";

    // Fall back to a registry-vendored `protoc` when the host has none installed,
    // so the build is reproducible without a system protobuf-compiler package.
    if std::env::var_os("PROTOC").is_none() {
        if let Ok(path) = protoc_bin_vendored::protoc_bin_path() {
            std::env::set_var("PROTOC", path);
        }
    }

    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .compile(&[proto_file], &["../../proto"])?;

    println!("cargo:rerun-if-changed={proto_file}");
    println!("cargo:rerun-if-changed=../../proto/hail/v1");

    Ok(())
}
