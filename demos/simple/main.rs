use openfeature_flipt::{ClientConfig, EvaluationContext, FeatureProvider, FliptProvider};

pub fn main() -> openfeature_flipt::Result<()> {
    // Configure env_logger to see provider logs.
    env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("flipt")).init();

    let host = std::env::var("FLIPT_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned());
    let mut config = ClientConfig::new(host);
    if let Ok(api_token) = std::env::var("FLIPT_API_TOKEN") {
        config.api_token(api_token);
    }
    if let Ok(namespace) = std::env::var("FLIPT_NAMESPACE") {
        config.namespace(namespace);
    }
    let provider = FliptProvider::from_config(config)?;

    let context = EvaluationContext::new()
        .with_targeting_key("test-subject")
        .with_attribute("country", "NZ");

    let enabled = provider.resolve_boolean_value("a-boolean-flag", false, &context)?;
    println!("a-boolean-flag: {:?}", enabled);

    let color = provider.resolve_string_value("a-string-flag", "red".to_owned(), &context)?;
    if let Some(error) = &color.error {
        println!("a-string-flag fell back to default: {}", error.message);
    }
    println!("a-string-flag: {:?}", color.value);

    Ok(())
}
