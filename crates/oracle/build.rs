fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Compile the ranking service proto (client and server stubs)
    tonic_build::compile_protos("../../proto/ranking.proto")?;
    Ok(())
}
