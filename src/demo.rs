use crate::cli::print_reports;
use tax_filing::config::AppConfig;
use tax_filing::error::AppError;
use tax_filing::filing::{Entity, FilingEngine, FilingFlag, FilingService};

fn example_entities() -> Vec<Entity> {
    vec![
        Entity::new("person_001")
            .with_name("Maria Schmidt")
            .with_wage_income(35_000)
            .with_flag(FilingFlag::IncorrectTaxCredits),
        Entity::new("person_002")
            .with_name("Hans Mueller")
            .with_non_wage_income(2_000),
        Entity::new("person_003")
            .with_name("Anna Weber")
            .with_wage_income(40_000)
            .with_flag(FilingFlag::SingleEmployer)
            .with_flag(FilingFlag::CorrectWageTax),
        Entity::new("person_004")
            .with_name("Lukas Gruber")
            .with_wage_income(20_000)
            .with_non_wage_income(2_000)
            .with_flag(FilingFlag::IncorrectTaxCredits),
        Entity::new("person_005")
            .with_name("Eva Berger")
            .with_wage_income(15_000)
            .with_flag(FilingFlag::EmploymentTaxNotFiled),
        Entity::new("person_006").with_name("Paul Huber"),
    ]
}

pub(crate) fn run_demo(config: &AppConfig) -> Result<(), AppError> {
    let service = FilingService::new(FilingEngine::with_thresholds(&config.filing.thresholds));

    for mut entity in example_entities() {
        entity.resident = true;
        service.set_facts(entity)?;
    }

    println!("Filing obligation demo");
    let reports: Vec<_> = service
        .classify_all()?
        .iter()
        .map(|verdict| verdict.report())
        .collect();
    print_reports(&reports, false)
}
