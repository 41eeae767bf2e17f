use crate::cmd::{GithubArgs, WorkflowArgs};
use crate::output::print_json;
use clap::Args;
use triggerbox_core::validate_workflows;

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    workflows: WorkflowArgs,
}

pub fn run(github: &GithubArgs, args: ValidateArgs, json: bool) -> anyhow::Result<()> {
    let settings = args.workflows.settings()?;
    let client = github.client()?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(validate_workflows(&client, &settings))?;

    let names: Vec<&str> = settings.workflows.workflows().collect();
    if json {
        print_json(&serde_json::json!({
            "valid": true,
            "workflows": names,
            "environments": settings.workflows,
        }))?;
    } else if names.is_empty() {
        println!("No workflows configured.");
    } else {
        for name in &names {
            match settings.workflows.environment_for(name) {
                Some(env) => println!("{name}: ok (approval in '{env}')"),
                None => println!("{name}: ok (dispatch)"),
            }
        }
    }
    Ok(())
}
