use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_root = PathBuf::from("../proto");

    // Tell cargo to recompile if any proto files change
    println!("cargo:rerun-if-changed=../proto/sso/v1/");

    tonic_build::configure()
        .build_server(true)
        .build_client(true) // Clients are used by the integration tests
        .file_descriptor_set_path(
            PathBuf::from(std::env::var("OUT_DIR")?).join("sso_service_descriptor.bin"),
        )
        .compile_protos(
            &[
                "../proto/sso/v1/auth.proto",
                "../proto/sso/v1/permissions.proto",
                "../proto/sso/v1/status.proto",
            ],
            &[proto_root],
        )?;

    Ok(())
}
