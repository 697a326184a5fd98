use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use warden_auth::{
    BootstrapReport, Claims, JwtDecoder, OwnerBootstrap, PasswordHasher, PasswordValidator,
    PermissionEnforcer,
};
use warden_core::ErrorKind;
use warden_core::config::{AuthConfig, OwnerConfig};
use warden_database::{IdentityStore, MemoryIdentityStore};
use warden_entity::{ClientMeta, UserStatus};
use warden_service::{CreateUserRequest, RequestContext, RoleService, UserAdminService};

const STRONG_PASSWORD: &str = "vK7#qLp9!zR2wXm";

struct Fixture {
    store: MemoryIdentityStore,
    users: UserAdminService,
    roles: RoleService,
    owner: BootstrapReport,
}

struct Services {
    store: MemoryIdentityStore,
    users: UserAdminService,
    roles: RoleService,
    hasher: PasswordHasher,
    validator: PasswordValidator,
}

fn services() -> Services {
    let config = AuthConfig {
        argon2_memory_kib: 1024,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..AuthConfig::default()
    };
    let store = MemoryIdentityStore::seeded();
    let shared: Arc<dyn IdentityStore> = Arc::new(store.clone());
    let hasher = PasswordHasher::new(&config).unwrap();
    let validator = PasswordValidator::new(&config);
    let enforcer = Arc::new(PermissionEnforcer::new(JwtDecoder::new(&config)));

    Services {
        users: UserAdminService::new(
            shared.clone(),
            Arc::new(hasher.clone()),
            Arc::new(validator.clone()),
            enforcer.clone(),
        ),
        roles: RoleService::new(shared, enforcer),
        store,
        hasher,
        validator,
    }
}

async fn fixture() -> Fixture {
    let s = services();
    let owner = OwnerBootstrap::new(Arc::new(s.store.clone()), s.hasher, s.validator)
        .run(&OwnerConfig::default())
        .await
        .unwrap();

    Fixture {
        store: s.store,
        users: s.users,
        roles: s.roles,
        owner,
    }
}

fn operator() -> RequestContext {
    RequestContext::operator()
}

fn caller(user_id: Uuid, scope: &[&str]) -> RequestContext {
    let now = Utc::now().timestamp();
    RequestContext::for_user(
        Claims {
            sub: user_id,
            role_ids: vec![],
            scope: scope.iter().map(|s| s.to_string()).collect(),
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + 60,
        },
        ClientMeta::default(),
    )
}

fn request(email: &str, role_ids: Vec<Uuid>) -> CreateUserRequest {
    CreateUserRequest {
        email: email.to_string(),
        password: STRONG_PASSWORD.to_string(),
        full_name: "Bea".to_string(),
        status: None,
        role_ids,
    }
}

#[tokio::test]
async fn test_create_user_with_roles() {
    let f = fixture().await;
    let editor = f.roles.create_role(&operator(), "editor", "Edits docs").await.unwrap();

    let profile = f
        .users
        .create_user(&operator(), request(" Bea@X.com ", vec![editor.id]))
        .await
        .unwrap();
    assert_eq!(profile.user.email, "bea@x.com");
    assert_eq!(profile.user.status, UserStatus::Active);
    assert_eq!(profile.roles, vec![editor]);

    let found = f.users.get_user_by_email(&operator(), "BEA@x.com").await.unwrap();
    assert_eq!(found.user.id, profile.user.id);

    let err = f
        .users
        .create_user(&operator(), request("BEA@x.com", vec![]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_create_user_rejects_bad_input() {
    let f = fixture().await;

    let mut weak = request("weak@x.com", vec![]);
    weak.password = "P@ssw0rd1".to_string();
    let err = f.users.create_user(&operator(), weak).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = f
        .users
        .create_user(&operator(), request("no-at-sign", vec![]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = f
        .users
        .create_user(&operator(), request("ghost@x.com", vec![Uuid::new_v4()]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_second_owner_rolls_back_user_creation() {
    let f = fixture().await;

    let err = f
        .users
        .create_user(&operator(), request("usurper@x.com", vec![f.owner.role_id]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvariantViolation);

    let mut tx = f.store.begin().await.unwrap();
    assert!(tx.find_user_by_email("usurper@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sole_owner_keeps_role_and_stays_active() {
    let f = fixture().await;
    let editor = f.roles.create_role(&operator(), "editor", "").await.unwrap();

    let err = f
        .users
        .set_user_roles(&operator(), f.owner.user_id, &[editor.id])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvariantViolation);

    let profile = f.users.get_user(&operator(), f.owner.user_id).await.unwrap();
    assert!(profile.is_owner());
    assert_eq!(profile.roles.len(), 1);

    for status in [UserStatus::Disabled, UserStatus::Deleted] {
        let err = f
            .users
            .set_user_status(&operator(), f.owner.user_id, status)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvariantViolation);
    }

    let profile = f
        .users
        .set_user_roles(&operator(), f.owner.user_id, &[f.owner.role_id, editor.id])
        .await
        .unwrap();
    assert_eq!(profile.roles.len(), 2);
}

#[tokio::test]
async fn test_owner_cannot_be_given_to_inactive_user() {
    let f = fixture().await;
    let mut req = request("idle@x.com", vec![]);
    req.status = Some(UserStatus::Disabled);
    let idle = f.users.create_user(&operator(), req).await.unwrap();

    let err = f
        .users
        .set_user_roles(&operator(), idle.user.id, &[f.owner.role_id])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvariantViolation);
}

#[tokio::test]
async fn test_status_changes() {
    let f = fixture().await;
    let bea = f
        .users
        .create_user(&operator(), request("bea@x.com", vec![]))
        .await
        .unwrap();

    let disabled = f
        .users
        .set_user_status(&operator(), bea.user.id, UserStatus::Disabled)
        .await
        .unwrap();
    assert_eq!(disabled.status, UserStatus::Disabled);

    let deleted = f
        .users
        .set_user_status(&operator(), bea.user.id, UserStatus::Deleted)
        .await
        .unwrap();
    assert!(deleted.deleted_at.is_some());

    let err = f.users.get_user(&operator(), bea.user.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UserNotFound);
}

#[tokio::test]
async fn test_caller_scope_is_enforced() {
    let f = fixture().await;
    let reader = caller(Uuid::new_v4(), &["users:read"]);

    assert!(f.users.get_user(&reader, f.owner.user_id).await.is_ok());

    let err = f
        .users
        .create_user(&reader, request("bea@x.com", vec![]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let err = f.roles.list_roles(&reader).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let admin = caller(Uuid::new_v4(), &["users:update", "users:delete"]);
    let err = f
        .users
        .set_user_status(&admin, admin.actor_id().unwrap(), UserStatus::Disabled)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_system_roles_are_read_only() {
    let f = fixture().await;

    let err = f.roles.delete_role(&operator(), f.owner.role_id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = f
        .roles
        .set_role_permissions(&operator(), f.owner.role_id, &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = f.roles.create_role(&operator(), "Owner", "").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_role_lifecycle() {
    let f = fixture().await;
    let ctx = operator();

    let editor = f.roles.create_role(&ctx, "editor", "").await.unwrap();
    let err = f.roles.create_role(&ctx, "editor", "").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let catalogue = f.roles.list_permissions(&ctx).await.unwrap();
    let users_read = catalogue.iter().find(|p| p.code == "users:read").unwrap();
    let granted = f
        .roles
        .set_role_permissions(&ctx, editor.id, &[users_read.id, users_read.id])
        .await
        .unwrap();
    assert_eq!(granted.len(), 1);

    let err = f
        .roles
        .set_role_permissions(&ctx, editor.id, &[Uuid::new_v4()])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let bea = f
        .users
        .create_user(&ctx, request("bea@x.com", vec![editor.id]))
        .await
        .unwrap();

    f.roles.delete_role(&ctx, editor.id).await.unwrap();
    let profile = f.users.get_user(&ctx, bea.user.id).await.unwrap();
    assert!(profile.roles.is_empty());

    let names: Vec<String> = f
        .roles
        .list_roles(&ctx)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["owner"]);

    let err = f.roles.delete_role(&ctx, editor.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_concurrent_owner_assignments_admit_one() {
    let s = services();
    let ctx = operator();
    let owner_role = s
        .roles
        .list_roles(&ctx)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.is_owner())
        .unwrap();

    let ada = s.users.create_user(&ctx, request("ada@x.com", vec![])).await.unwrap();
    let bea = s.users.create_user(&ctx, request("bea@x.com", vec![])).await.unwrap();

    let owner_roles = [owner_role.id];
    let (a, b) = tokio::join!(
        s.users.set_user_roles(&ctx, ada.user.id, &owner_roles),
        s.users.set_user_roles(&ctx, bea.user.id, &owner_roles),
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let err = a.err().or(b.err()).unwrap();
    assert_eq!(err.kind, ErrorKind::InvariantViolation);

    let mut tx = s.store.begin().await.unwrap();
    assert_eq!(
        tx.count_role_holders_except(owner_role.id, Uuid::nil())
            .await
            .unwrap(),
        1
    );
}
