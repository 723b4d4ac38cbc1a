fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/capital_budget.proto");

    // Only the gRPC surface needs generated code; library builds skip protoc.
    if std::env::var_os("CARGO_FEATURE_SERVER").is_some() {
        tonic_build::compile_protos("proto/capital_budget.proto")?;
    }

    Ok(())
}
