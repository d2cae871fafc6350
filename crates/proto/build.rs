use std::path::PathBuf;

/// Proto source files to compile.
const PROTO_FILES: &[&str] = &["proto/library.proto"];
const PROTO_INCLUDES: &[&str] = &["proto"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(false)
        .file_descriptor_set_path(out_dir.join("library_descriptor.bin"))
        .compile_protos(PROTO_FILES, PROTO_INCLUDES)?;

    for path in PROTO_FILES {
        println!("cargo:rerun-if-changed={path}");
    }
    Ok(())
}
