//! List the scenario catalogue

use clap::Args;

use storefront_e2e::ScenarioFilter;

use crate::output::{print_list, OutputFormat, ScenarioRow};

use super::run::FilterArgs;

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
}

pub fn execute(args: ListArgs, format: OutputFormat) -> anyhow::Result<()> {
    let filter: ScenarioFilter = args.filter.into();
    let rows: Vec<ScenarioRow> = filter.select()?.iter().map(ScenarioRow::from).collect();
    print_list(&rows, format);
    Ok(())
}
