//! User management commands.

use clap::{Args, Subcommand};
use uuid::Uuid;

use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_entity::{UserProfile, UserStatus};
use warden_service::{CreateUserRequest, RequestContext, UserAdminService};

use super::{Backend, prompt_password, prompt_text, role::resolve_role_ids};
use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user
    Create {
        /// Login email (prompted if omitted)
        #[arg(short, long)]
        email: Option<String>,
        /// Display name
        #[arg(short = 'n', long, default_value = "")]
        full_name: String,
        /// Password (prompted if omitted)
        #[arg(short, long)]
        password: Option<String>,
        /// Initial status
        #[arg(short, long, default_value = "active")]
        status: UserStatus,
        /// Role names to assign; repeat for several
        #[arg(short, long = "role")]
        roles: Vec<String>,
    },
    /// Show a user and their roles
    Show {
        /// User email or ID
        user: String,
    },
    /// Replace a user's roles
    Roles {
        /// User email or ID
        user: String,
        /// Role names; omit to clear every role
        #[arg(short, long = "role")]
        roles: Vec<String>,
    },
    /// Change a user's status
    Status {
        /// User email or ID
        user: String,
        /// active, disabled or deleted
        status: UserStatus,
    },
}

pub async fn execute(
    args: &UserArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let backend = Backend::connect(config).await?;
    let ctx = RequestContext::operator();

    match &args.command {
        UserCommand::Create {
            email,
            full_name,
            password,
            status,
            roles,
        } => {
            let email = prompt_text(email, "Email")?;
            let password = prompt_password(password, "Password")?;
            let role_ids = resolve_role_ids(&backend.roles, &ctx, roles).await?;

            let profile = backend
                .users
                .create_user(
                    &ctx,
                    CreateUserRequest {
                        email,
                        password,
                        full_name: full_name.clone(),
                        status: Some(*status),
                        role_ids,
                    },
                )
                .await?;
            output::print_success(&format!("User '{}' created", profile.user.email));
            print_profile(&profile, format)?;
        }
        UserCommand::Show { user } => {
            let profile = find_profile(&backend.users, &ctx, user).await?;
            print_profile(&profile, format)?;
        }
        UserCommand::Roles { user, roles } => {
            let user_id = find_profile(&backend.users, &ctx, user).await?.user.id;
            let role_ids = resolve_role_ids(&backend.roles, &ctx, roles).await?;
            let profile = backend.users.set_user_roles(&ctx, user_id, &role_ids).await?;
            output::print_success(&format!("Roles of '{}' replaced", profile.user.email));
            print_profile(&profile, format)?;
        }
        UserCommand::Status { user, status } => {
            let user_id = find_profile(&backend.users, &ctx, user).await?.user.id;
            let updated = backend.users.set_user_status(&ctx, user_id, *status).await?;
            output::print_success(&format!("User '{}' is now {}", updated.email, updated.status));
        }
    }

    backend.close().await;
    Ok(())
}

/// Accepts either a user ID or a login email.
async fn find_profile(
    users: &UserAdminService,
    ctx: &RequestContext,
    user: &str,
) -> Result<UserProfile, AppError> {
    match Uuid::parse_str(user) {
        Ok(id) => users.get_user(ctx, id).await,
        Err(_) => users.get_user_by_email(ctx, user).await,
    }
}

fn print_profile(profile: &UserProfile, format: OutputFormat) -> Result<(), AppError> {
    let user = &profile.user;
    let roles = profile
        .roles
        .iter()
        .map(|r| r.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    output::print_record(
        profile,
        &[
            ("ID", user.id.to_string()),
            ("Email", user.email.clone()),
            ("Name", user.full_name.clone()),
            ("Status", user.status.to_string()),
            ("Roles", roles),
            (
                "Last login",
                user.last_login_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string()),
            ),
            ("Created", user.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ],
        format,
    )
}
