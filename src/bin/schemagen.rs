use garage_provider::provider::GarageProvider;

fn main() -> anyhow::Result<()> {
    let schema = GarageProvider::new().schema();

    println!("---");
    print!("{}", serde_yaml::to_string(&schema.provider)?);
    for schema in schema.resources.values().chain(schema.data_sources.values()) {
        println!("---");
        print!("{}", serde_yaml::to_string(schema)?);
    }

    Ok(())
}
