use relay_config::KafkaConfig;
use rdkafka::config::ClientConfig;
use tracing::info;

/// Build the base rdkafka client configuration.
///
/// Sets the bootstrap servers and the security protocol:
/// - `ssl` when `ssl_enabled`
/// - `sasl_ssl` / `sasl_plaintext` when a SASL mechanism and credentials are
///   all present
pub fn create_client_config(config: &KafkaConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config.set("bootstrap.servers", &config.brokers);
    client_config.set("security.protocol", "plaintext");

    if config.ssl_enabled {
        info!("Enabling SSL/TLS for Kafka connection");
        client_config.set("security.protocol", "ssl");
    }

    if let (Some(mechanism), Some(username), Some(password)) = (
        &config.sasl_mechanism,
        &config.sasl_username,
        &config.sasl_password,
    ) {
        info!(sasl_mechanism = %mechanism, "Configuring SASL authentication");
        client_config
            .set("sasl.mechanism", mechanism)
            .set("sasl.username", username)
            .set("sasl.password", password)
            .set(
                "security.protocol",
                if config.ssl_enabled {
                    "sasl_ssl"
                } else {
                    "sasl_plaintext"
                },
            );
    }

    client_config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> KafkaConfig {
        KafkaConfig {
            brokers: "kafka1:9092,kafka2:9092".to_string(),
            consumer_group: "consumerGroup".to_string(),
            es_topic: "esInfobot".to_string(),
            ru_topic: "ruInfobot".to_string(),
            partition: 0,
            ssl_enabled: false,
            sasl_mechanism: None,
            sasl_username: None,
            sasl_password: None,
        }
    }

    #[test]
    fn test_plaintext_by_default() {
        let client = create_client_config(&base());
        assert_eq!(client.get("bootstrap.servers"), Some("kafka1:9092,kafka2:9092"));
        assert_eq!(client.get("security.protocol"), Some("plaintext"));
        assert_eq!(client.get("sasl.mechanism"), None);
    }

    #[test]
    fn test_sasl_over_ssl() {
        let mut config = base();
        config.ssl_enabled = true;
        config.sasl_mechanism = Some("SCRAM-SHA-256".to_string());
        config.sasl_username = Some("relay".to_string());
        config.sasl_password = Some("pw".to_string());

        let client = create_client_config(&config);
        assert_eq!(client.get("security.protocol"), Some("sasl_ssl"));
        assert_eq!(client.get("sasl.mechanism"), Some("SCRAM-SHA-256"));
    }

    #[test]
    fn test_partial_sasl_is_ignored() {
        let mut config = base();
        config.sasl_mechanism = Some("PLAIN".to_string());

        let client = create_client_config(&config);
        assert_eq!(client.get("security.protocol"), Some("plaintext"));
    }
}
