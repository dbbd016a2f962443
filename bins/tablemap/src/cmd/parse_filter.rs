use tablemap_api::{StoreQuery, filter};

use crate::config::ParseFilterArgs;
use crate::error::CliError;

pub fn run(args: ParseFilterArgs) -> Result<(), CliError> {
    let predicate = filter::parse(&args.text)?
        .ok_or_else(|| CliError::NotAFilter(args.text.clone()))?;

    println!("property: {}", predicate.property);
    println!("operator: {:?} ({})", predicate.operator, predicate.operator);
    println!("value:    {}", predicate.value);

    let query = StoreQuery::partition(args.partition_key).with_predicate(predicate);
    println!("filter:   {query}");
    Ok(())
}
