use super::*;

#[test]
fn parses_extract_with_companies_and_year() {
    let cli = Cli::try_parse_from([
        "annualcmp",
        "extract",
        "a.pdf",
        "b.pdf",
        "--company",
        "Acme",
        "--year",
        "2023",
    ])
    .expect("expected valid cli args");

    let Commands::Extract { docs } = cli.command else {
        panic!("expected extract command");
    };
    let inputs = docs.inputs(2024).expect("inputs");
    assert_eq!(
        inputs,
        vec![
            DocumentInput {
                path: PathBuf::from("a.pdf"),
                company_hint: "Acme".to_string(),
                fiscal_year: 2023,
            },
            DocumentInput {
                path: PathBuf::from("b.pdf"),
                company_hint: String::new(),
                fiscal_year: 2023,
            },
        ]
    );
}

#[test]
fn year_defaults_to_configured_value() {
    let cli =
        Cli::try_parse_from(["annualcmp", "extract", "a.pdf"]).expect("expected valid cli args");
    let Commands::Extract { docs } = cli.command else {
        panic!("expected extract command");
    };
    assert_eq!(docs.inputs(2022).expect("inputs")[0].fiscal_year, 2022);
}

#[test]
fn more_companies_than_pdfs_is_rejected() {
    let cli = Cli::try_parse_from([
        "annualcmp",
        "extract",
        "a.pdf",
        "--company",
        "Acme",
        "--company",
        "Beta",
    ])
    .expect("expected valid cli args");
    let Commands::Extract { docs } = cli.command else {
        panic!("expected extract command");
    };
    assert!(docs.inputs(2024).is_err());
}

#[test]
fn extract_requires_at_least_one_pdf() {
    assert!(Cli::try_parse_from(["annualcmp", "extract"]).is_err());
}

#[test]
fn parses_search_with_top_k() {
    let cli = Cli::try_parse_from([
        "annualcmp", "search", "a.pdf", "--query", "revenue", "--top-k", "3",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Search {
            top_k: Some(3),
            ref query,
            ..
        } if query == "revenue"
    ));
}

#[test]
fn search_requires_query() {
    assert!(Cli::try_parse_from(["annualcmp", "search", "a.pdf"]).is_err());
}

#[test]
fn parses_ask_with_mock_llm() {
    let cli = Cli::try_parse_from(["annualcmp", "ask", "a.pdf", "--query", "debt", "--mock-llm"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Ask {
            mock_llm: true,
            top_k: None,
            ..
        }
    ));
}

#[test]
fn parses_catalog() {
    let cli = Cli::try_parse_from(["annualcmp", "catalog"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Catalog));
}
