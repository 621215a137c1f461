use docpress::config::Config;
use docpress::engine::StrategyChain;

#[test]
fn parse_example_config() {
    let raw = include_str!("../docpress.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.server.max_upload_bytes, 16 * 1024 * 1024);
    assert_eq!(cfg.conversion.strategies, vec!["office", "pandoc"]);
    assert!(!cfg.paths.upload_dir.is_empty());
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: Config = toml::from_str("[server]\nbind = \"127.0.0.1\"\nport = 8080\nmax_upload_bytes = 10\n")
        .expect("parse TOML");
    assert_eq!(cfg.server.bind_address(), "127.0.0.1:8080");
    assert_eq!(cfg.cors.allowed_origins, vec!["*"]);
    assert_eq!(cfg.office.executable, "auto");
    assert!(cfg.is_allowed_extension("DOCM"));
    assert!(!cfg.is_allowed_extension("pdf"));
}

#[test]
fn unknown_strategy_is_rejected() {
    let mut cfg = Config::default();
    cfg.conversion.strategies = vec!["office".into(), "wordperfect".into()];
    let err = StrategyChain::from_config(&cfg).err().expect("should fail");
    assert!(err.to_string().contains("wordperfect"));
}

#[test]
fn empty_strategy_list_is_rejected() {
    let mut cfg = Config::default();
    cfg.conversion.strategies.clear();
    assert!(StrategyChain::from_config(&cfg).is_err());
}

#[test]
fn default_chain_order() {
    let chain = StrategyChain::from_config(&Config::default()).expect("chain");
    assert_eq!(chain.names(), vec!["office", "pandoc"]);
}
