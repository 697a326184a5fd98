//! Role and permission management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_entity::{Permission, Role};
use warden_service::{RequestContext, RoleService};

use super::Backend;
use crate::output::{self, OutputFormat};

/// Arguments for role commands
#[derive(Debug, Args)]
pub struct RoleArgs {
    #[command(subcommand)]
    pub command: RoleCommand,
}

/// Role subcommands
#[derive(Debug, Subcommand)]
pub enum RoleCommand {
    /// List roles
    List,
    /// List the permission catalogue
    Permissions,
    /// Create a role
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Delete a role and its assignments
    Delete {
        name: String,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
    /// Replace the permissions a role grants
    Grant {
        name: String,
        /// Permission codes such as `users:read`; omit to revoke all
        #[arg(short, long = "permission")]
        permissions: Vec<String>,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct RoleRow {
    id: String,
    name: String,
    description: String,
    system: bool,
}

impl From<&Role> for RoleRow {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id.to_string(),
            name: role.name.clone(),
            description: role.description.clone(),
            system: role.is_system,
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct PermissionRow {
    id: String,
    code: String,
    resource: String,
    action: String,
}

impl From<&Permission> for PermissionRow {
    fn from(p: &Permission) -> Self {
        Self {
            id: p.id.to_string(),
            code: p.code.clone(),
            resource: p.resource.clone(),
            action: p.action.clone(),
        }
    }
}

pub async fn execute(
    args: &RoleArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let backend = Backend::connect(config).await?;
    let ctx = RequestContext::operator();
    let roles = &backend.roles;

    match &args.command {
        RoleCommand::List => {
            let rows: Vec<RoleRow> = roles.list_roles(&ctx).await?.iter().map(Into::into).collect();
            output::print_list(&rows, format)?;
        }
        RoleCommand::Permissions => {
            let rows: Vec<PermissionRow> = roles
                .list_permissions(&ctx)
                .await?
                .iter()
                .map(Into::into)
                .collect();
            output::print_list(&rows, format)?;
        }
        RoleCommand::Create { name, description } => {
            let role = roles.create_role(&ctx, name, description).await?;
            output::print_success(&format!("Role '{}' created (id: {})", role.name, role.id));
        }
        RoleCommand::Delete { name, force } => {
            let role = find_role(roles, &ctx, name).await?;
            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Delete role '{}' and remove it from every user?",
                        role.name
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {e}")))?;
                if !confirm {
                    println!("Cancelled.");
                    backend.close().await;
                    return Ok(());
                }
            }
            roles.delete_role(&ctx, role.id).await?;
            output::print_success(&format!("Role '{}' deleted", role.name));
        }
        RoleCommand::Grant { name, permissions } => {
            let role = find_role(roles, &ctx, name).await?;
            let catalogue = roles.list_permissions(&ctx).await?;
            let ids = permissions
                .iter()
                .map(|code| {
                    catalogue
                        .iter()
                        .find(|p| p.code == *code)
                        .map(|p| p.id)
                        .ok_or_else(|| AppError::not_found(format!("Permission '{code}' not found")))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let granted = roles.set_role_permissions(&ctx, role.id, &ids).await?;
            output::print_success(&format!(
                "Role '{}' now grants {} permission(s)",
                role.name,
                granted.len()
            ));
            let rows: Vec<PermissionRow> = granted.iter().map(Into::into).collect();
            output::print_list(&rows, format)?;
        }
    }

    backend.close().await;
    Ok(())
}

async fn find_role(roles: &RoleService, ctx: &RequestContext, name: &str) -> Result<Role, AppError> {
    roles
        .list_roles(ctx)
        .await?
        .into_iter()
        .find(|r| r.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| AppError::not_found(format!("Role '{name}' not found")))
}

/// Map role names to IDs, failing on the first unknown name.
pub async fn resolve_role_ids(
    roles: &RoleService,
    ctx: &RequestContext,
    names: &[String],
) -> Result<Vec<Uuid>, AppError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let known = roles.list_roles(ctx).await?;
    names
        .iter()
        .map(|name| {
            known
                .iter()
                .find(|r| r.name.eq_ignore_ascii_case(name))
                .map(|r| r.id)
                .ok_or_else(|| AppError::not_found(format!("Role '{name}' not found")))
        })
        .collect()
}
