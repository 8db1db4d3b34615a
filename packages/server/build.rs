fn main() -> Result<(), Box<dyn std::error::Error>> {
    // No system protoc is available in the build environment; point
    // tonic-build at the vendored binary so codegen can run.
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }
    tonic_build::compile_protos("proto/logging.proto")?;
    Ok(())
}
