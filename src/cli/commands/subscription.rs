//! Subscription command implementations.

use colored::Colorize;
use serde::Serialize;

use super::print_json;
use crate::backend;
use crate::billing::{BillingClient, Plan, SubscriptionStatus};
use crate::cli::{Context, SubscriptionCommands};
use crate::config::{read_session, StoredSession};
use crate::error::{Error, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivateOutput<'a> {
    customer_id: &'a str,
    plan: Plan,
    activated: bool,
}

/// Parse a paid plan name.
fn paid_plan(name: &str) -> Result<Plan> {
    match Plan::parse(name) {
        Some(plan @ (Plan::Pro | Plan::Business)) => Ok(plan),
        _ => Err(Error::InvalidArgument(format!(
            "Invalid plan '{name}': expected pro or business"
        ))),
    }
}

/// Execute subscription commands.
///
/// # Errors
///
/// Returns `NotAuthenticated` when signed out, or the payment error.
pub fn execute(command: &SubscriptionCommands, ctx: &Context, json: bool) -> Result<()> {
    let stored: StoredSession = read_session(&ctx.config.home).ok_or(Error::NotAuthenticated)?;
    let backend = backend::open(&stored.backend_url, ctx.config.anon_key.as_deref())?;
    let client = BillingClient::new(backend, &ctx.config.admin_emails);
    let session = Some(&stored.session);
    let email = stored.session.email.as_str();

    match command {
        SubscriptionCommands::Status => {
            let report = client.status(session, Some(email));
            if json {
                return print_json(&report);
            }
            print_status(&report.subscription);
            if let Some(error) = report.error {
                println!("{} {error}", "Warning:".yellow());
            }
            Ok(())
        }
        SubscriptionCommands::Cancel => {
            let report = client.status(session, Some(email));
            if let Some(error) = report.error {
                return Err(Error::Payment(error));
            }
            let updated = client.cancel(session, &report.subscription)?;
            if json {
                return print_json(&updated);
            }
            println!("Subscription will cancel at the end of the billing period.");
            print_status(&updated);
            Ok(())
        }
        SubscriptionCommands::Setup { plan } => {
            let intent = client.create_setup_intent(session, email, paid_plan(plan)?)?;
            if json {
                return print_json(&intent);
            }
            println!("Customer:      {}", intent.customer_id);
            println!("Client secret: {}", intent.client_secret);
            println!(
                "Collect the card with this secret, then run `op subscription activate {}`.",
                intent.customer_id
            );
            Ok(())
        }
        SubscriptionCommands::Activate { customer_id, plan } => {
            let plan = paid_plan(plan)?;
            client.activate(session, customer_id, plan)?;
            if json {
                return print_json(&ActivateOutput {
                    customer_id,
                    plan,
                    activated: true,
                });
            }
            println!("{} {} plan activated.", "Done:".green(), plan.as_str());
            Ok(())
        }
    }
}

fn print_status(status: &SubscriptionStatus) {
    let plan = if status.is_paid() {
        status.plan.as_str().green().bold()
    } else {
        status.plan.as_str().normal()
    };
    println!("{} {plan}", "Plan:".cyan().bold());
    println!("  Status: {:?}", status.status);
    if let Some(end) = status.period_end() {
        let verb = if status.cancel_at_period_end { "Ends" } else { "Renews" };
        println!("  {verb}:  {}", end.format("%Y-%m-%d"));
    }
}
