// src/modules/auth/user_interface.rs
use std::io;
use std::time::Instant;

use super::guard::Navigate;
use super::notice::{Field, FieldErrors, Notice, NoticeLevel};
use super::sign_in::SignInFlow;
use super::store::TokenStore;
use super::validation::{validate_confirm_password, validate_name, validate_password};
use super::verification::{RegistrationVerification, VerificationStatus};
use crate::modules::client::gateway::ApiGateway;
use crate::modules::utils::io::{prompt, prompt_with_confirmation};
use crate::modules::utils::time::{format_duration, take_elapsed_seconds};
use crate::RESEND_COOLDOWN_SECS;

const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// How an interactive session ended
#[derive(Debug, PartialEq, Eq)]
pub enum FlowOutcome {
    Navigate(Navigate), // Finished; go here next
    Cancelled,          // User backed out
    Failed,             // Gave up after repeated failures
}

/// Prints drained notices, one per line
pub fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        let tag = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
        };
        println!("[{}] {}", tag, notice.message);
        if let Some(action) = notice.action {
            println!("      {} -> {}", action.label, action.navigate_to);
        }
    }
}

/// Prints inline errors; returns `true` if there were any
pub fn print_field_errors(errors: &FieldErrors) -> bool {
    let fields = [
        (Field::Firstname, "First name"),
        (Field::Lastname, "Last name"),
        (Field::Email, "Email"),
        (Field::Password, "Password"),
        (Field::ConfirmPassword, "Confirm password"),
        (Field::Code, "Code"),
    ];
    let mut any = false;
    for (field, label) in fields {
        if let Some(message) = errors.get(field) {
            println!("  {}: {}", label, message);
            any = true;
        }
    }
    any
}

/// Helper function to read a password without echo
pub fn read_password(label: &str) -> io::Result<String> {
    rpassword::prompt_password(label)
}

/// Interactive sign-in. `location` is the login page location, which may
/// carry a return path; without one the user lands on `landing_path`.
pub async fn run_login<G: ApiGateway>(
    gateway: &G,
    store: &TokenStore,
    email: Option<String>,
    location: &str,
    landing_path: &str,
) -> io::Result<FlowOutcome> {
    println!("\n=== Sign In ===");
    let mut flow = SignInFlow::from_location(location).with_landing_path(landing_path);
    let mut email = email;

    for attempt in 1..=MAX_LOGIN_ATTEMPTS {
        let typed = match email.take() {
            Some(value) => value,
            None => prompt("Email: ")?,
        };
        flow.set_email(&typed);
        flow.set_password(&read_password("Password: ")?);

        if let Some(next) = flow.submit(gateway, store).await {
            print_notices(flow.take_notices());
            return Ok(FlowOutcome::Navigate(next));
        }

        print_field_errors(flow.field_errors());
        print_notices(flow.take_notices());
        if attempt < MAX_LOGIN_ATTEMPTS {
            println!(
                "Please try again. {} attempts remaining.",
                MAX_LOGIN_ATTEMPTS - attempt
            );
        }
    }

    Ok(FlowOutcome::Failed)
}

fn read_name(label: &'static str) -> io::Result<String> {
    loop {
        let name = prompt(&format!("{}: ", label))?;
        match validate_name(name.trim(), label) {
            Ok(()) => return Ok(name),
            Err(e) => println!("  {}", e),
        }
    }
}

fn read_new_password() -> io::Result<(String, String)> {
    loop {
        println!("\nPassword: min 8 chars with uppercase, lowercase, number, and one of !@#$%^&*");
        let password = read_password("Password: ")?;
        if let Err(e) = validate_password(password.trim()) {
            println!("  {}", e);
            continue;
        }

        let confirm = read_password("Confirm password: ")?;
        match validate_confirm_password(password.trim(), confirm.trim()) {
            Ok(()) => return Ok((password, confirm)),
            Err(e) => println!("  {}", e),
        }
    }
}

/// Applies the wall-clock time since `mark` to the resend countdown
fn catch_up_cooldown(flow: &mut RegistrationVerification, mark: &mut Instant) {
    flow.advance(take_elapsed_seconds(mark));
}

/// A freshly started countdown runs from the moment the code went out
fn restart_mark_if_sent(flow: &RegistrationVerification, mark: &mut Instant) {
    if flow.resend_cooldown() == RESEND_COOLDOWN_SECS {
        *mark = Instant::now();
    }
}

/// Sends the code for an email typed by the user until one is accepted.
/// Returns `false` if the user cancelled.
async fn request_code_step<G: ApiGateway>(
    gateway: &G,
    flow: &mut RegistrationVerification,
    mark: &mut Instant,
) -> io::Result<bool> {
    loop {
        let email = prompt("\nEmail (or 'exit'): ")?;
        catch_up_cooldown(flow, mark);
        if email.eq_ignore_ascii_case("exit") {
            return Ok(false);
        }

        flow.request_code(gateway, &email).await;
        restart_mark_if_sent(flow, mark);
        print_field_errors(flow.field_errors());
        print_notices(flow.take_notices());

        if flow.status() == VerificationStatus::AwaitingCode {
            return Ok(true);
        }
    }
}

enum CodeStep {
    Verified,
    ChangeEmail,
    Cancelled,
}

/// Reads codes until one verifies. The resend countdown advances by the
/// wall-clock time spent waiting on input.
async fn verify_code_step<G: ApiGateway>(
    gateway: &G,
    flow: &mut RegistrationVerification,
    mark: &mut Instant,
) -> io::Result<CodeStep> {
    loop {
        println!(
            "\nEnter the 6-digit code sent to {} ('resend', 'back' to change email, 'exit'):",
            flow.email()
        );
        let input = prompt("> ")?;
        catch_up_cooldown(flow, mark);

        match input.to_lowercase().as_str() {
            "exit" => return Ok(CodeStep::Cancelled),
            "back" => return Ok(CodeStep::ChangeEmail),
            "resend" => {
                if flow.can_resend() {
                    flow.resend_code(gateway).await;
                    restart_mark_if_sent(flow, mark);
                } else {
                    println!(
                        "You can request a new code in {}.",
                        format_duration(u64::from(flow.resend_cooldown()))
                    );
                }
            }
            code => {
                flow.submit_code(gateway, code).await;
                if flow.status() == VerificationStatus::Verified {
                    print_notices(flow.take_notices());
                    return Ok(CodeStep::Verified);
                }
            }
        }

        print_field_errors(flow.field_errors());
        print_notices(flow.take_notices());
    }
}

/// Interactive registration: names, email ownership, password, account creation
pub async fn run_registration<G: ApiGateway>(
    gateway: &G,
    store: &TokenStore,
    landing_path: &str,
) -> io::Result<FlowOutcome> {
    println!("\n=== Registration ===");
    let mut flow = RegistrationVerification::new().with_landing_path(landing_path);

    let firstname = read_name("First name")?;
    flow.set_field(Field::Firstname, &firstname);
    let lastname = read_name("Last name")?;
    flow.set_field(Field::Lastname, &lastname);

    // Email ownership first; 'back' from the code prompt returns here.
    // One clock for both prompts so the countdown keeps running across them.
    let mut mark = Instant::now();
    loop {
        if !request_code_step(gateway, &mut flow, &mut mark).await? {
            flow.dispose();
            return Ok(FlowOutcome::Cancelled);
        }
        match verify_code_step(gateway, &mut flow, &mut mark).await? {
            CodeStep::Verified => break,
            CodeStep::ChangeEmail => continue,
            CodeStep::Cancelled => {
                flow.dispose();
                return Ok(FlowOutcome::Cancelled);
            }
        }
    }

    loop {
        let (password, confirm) = read_new_password()?;
        flow.set_field(Field::Password, &password);
        flow.set_field(Field::ConfirmPassword, &confirm);

        if let Some(next) = flow.finalize(gateway, store).await {
            print_notices(flow.take_notices());
            return Ok(FlowOutcome::Navigate(next));
        }

        print_field_errors(flow.field_errors());
        print_notices(flow.take_notices());

        if flow.status() != VerificationStatus::Verified
            || !prompt_with_confirmation("Registration did not complete.", "Try again?")?
        {
            flow.dispose();
            return Ok(FlowOutcome::Failed);
        }
    }
}
