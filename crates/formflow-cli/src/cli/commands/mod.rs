use super::args::*;

pub mod bindings;
pub mod fetch;
pub mod fill;
pub mod validate;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let global = cli.global;
    match cli.cmd {
        Command::Fetch(args) => fetch::run(args, &global).await,
        Command::Bindings(args) => bindings::run(args),
        Command::Validate(args) => validate::run(args),
        Command::Fill(args) => fill::run(args, &global).await,
    }
}
