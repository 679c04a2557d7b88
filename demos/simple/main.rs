#[tokio::main]
pub async fn main() -> flipper::Result<()> {
    env_logger::init();

    // Reads the API key from FLIP_API_KEY.
    let client = flipper::ClientConfig::new().cache(true).to_client()?;

    let tenant_id = std::env::args().nth(1).unwrap_or_else(|| "acme".to_owned());

    // Fetch all flippers once. Lookups below are served from the cache.
    match client.load_flipper_data(&tenant_id).await {
        Ok(data) => println!("Loaded {} flippers", data.flipper_data().len()),
        Err(err) => println!("Error: {}", err),
    }

    // Falls back to `false` if the flipper is missing or the request failed.
    let enabled = client.is_enabled("a-boolean-flipper", &tenant_id).await;
    println!("a-boolean-flipper: {:?}", enabled);

    let values = client.get_string_list("a-string-list-flipper", &tenant_id).await;
    println!("a-string-list-flipper: {:?}", values);

    Ok(())
}
