//! Integration tests for the RBAC core against a live database
//!
//! These exercise the synchronizer, grant matrix, and field overlay with
//! real transactions. They need PostgreSQL (DATABASE_URL), so they are
//! ignored by default; run with `cargo test -- --ignored` against a local
//! stack.

use serial_test::serial;
use sqlx::PgPool;
use uuid::Uuid;

use common::database::{DatabaseConfig, init_pool};
use rbac::catalog::PermissionCatalog;
use rbac::classifier::ClassifierConfig;
use rbac::error::RbacError;
use rbac::manifest::RouteManifest;
use rbac::models::{FieldAccess, NewRole, NewUser};
use rbac::repositories::{
    FieldPermissionRepository, PermissionRepository, RolePermissionRepository, RoleRepository,
    UserRepository,
};
use rbac::sync::PermissionSynchronizer;

const USERS_MANIFEST: &str = r#"{
    "version": 1,
    "routes": [
        {"uri": "api/widgets", "methods": ["GET", "HEAD"], "name": "widgets.index"},
        {"uri": "api/widgets/{id}", "methods": ["GET"], "name": "widgets.show"},
        {"uri": "api/widgets", "methods": ["POST"], "name": "widgets.store"},
        {"uri": "api/gadgets", "methods": ["GET"], "name": "gadgets.index"}
    ]
}"#;

const SHRUNK_MANIFEST: &str = r#"{
    "version": 1,
    "routes": [
        {"uri": "api/widgets", "methods": ["GET"], "name": "widgets.index"},
        {"uri": "api/widgets/{id}", "methods": ["GET"], "name": "widgets.show"},
        {"uri": "api/widgets", "methods": ["POST"], "name": "widgets.store"}
    ]
}"#;

async fn setup() -> PgPool {
    let config = DatabaseConfig::from_env().expect("database config");
    let pool = init_pool(&config).await.expect("database pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    sqlx::query(
        "TRUNCATE role_permission, field_permissions, user_roles, user_permissions, \
         permissions, roles, users CASCADE",
    )
    .execute(&pool)
    .await
    .expect("truncate");

    pool
}

fn synchronizer(pool: &PgPool) -> PermissionSynchronizer {
    PermissionSynchronizer::new(
        pool.clone(),
        ClassifierConfig::default(),
        PermissionCatalog::new(pool.clone()),
    )
}

fn manifest(json: &str) -> RouteManifest {
    RouteManifest::from_json_str(json).expect("manifest")
}

async fn create_role(pool: &PgPool, name: &str) -> Uuid {
    RoleRepository::new(pool.clone())
        .create(&NewRole {
            name: name.to_string(),
            display_name: name.to_string(),
            description: None,
        })
        .await
        .expect("role")
        .id
}

#[tokio::test]
#[serial]
#[ignore = "requires a running postgres"]
async fn test_sync_is_idempotent() {
    let pool = setup().await;
    let sync = synchronizer(&pool);
    let manifest = manifest(USERS_MANIFEST);

    let first = sync.sync(&manifest).await.expect("first sync");
    let second = sync.sync(&manifest).await.expect("second sync");

    // HEAD is skipped, so 4 classified routes per run
    assert_eq!(first.synced_count, 4);
    assert_eq!(second.synced_count, 4);

    let permissions = PermissionRepository::new(pool.clone())
        .list_active_api()
        .await
        .expect("list");
    assert_eq!(permissions.len(), 4, "no duplicate rows after re-sync");

    let names: Vec<&str> = permissions.iter().map(|p| p.name.as_str()).collect();
    assert!(names.contains(&"widget.index"));
    assert!(names.contains(&"widget.show"));
    assert!(names.contains(&"widget.store"));
    assert!(names.contains(&"gadget.index"));
}

#[tokio::test]
#[serial]
#[ignore = "requires a running postgres"]
async fn test_cleanup_deactivates_without_deleting() {
    let pool = setup().await;
    let sync = synchronizer(&pool);
    let permissions = PermissionRepository::new(pool.clone());

    sync.sync(&manifest(USERS_MANIFEST)).await.expect("sync");

    // The gadgets route disappears from the inventory
    let report = sync
        .cleanup(&manifest(SHRUNK_MANIFEST))
        .await
        .expect("cleanup");
    assert_eq!(report.synced_count, 3);
    assert_eq!(report.deactivated_count, 1);

    let stale = permissions
        .find_by_name("gadget.index")
        .await
        .expect("find")
        .expect("row must survive cleanup");
    assert!(!stale.is_active);
    assert!(stale.is_api_route);
    assert!(stale.deactivated_at.is_some());

    let grouped = PermissionCatalog::new(pool.clone())
        .grouped_by_resource()
        .await
        .expect("grouped");
    assert!(
        grouped.iter().all(|g| g.resource != "gadgets"),
        "inactive permissions must not appear in the grouped catalog"
    );

    // Re-adding the route reactivates the same row
    sync.sync(&manifest(USERS_MANIFEST)).await.expect("re-sync");
    let revived = permissions
        .find_by_name("gadget.index")
        .await
        .expect("find")
        .expect("row");
    assert_eq!(revived.id, stale.id);
    assert!(revived.is_active);
    assert!(revived.deactivated_at.is_none());
}

#[tokio::test]
#[serial]
#[ignore = "requires a running postgres"]
async fn test_grant_and_revoke_are_idempotent() {
    let pool = setup().await;
    let sync = synchronizer(&pool);
    sync.sync(&manifest(USERS_MANIFEST)).await.expect("sync");

    let grants = RolePermissionRepository::new(pool.clone());
    let role_id = create_role(&pool, "editor").await;
    let permission = PermissionRepository::new(pool.clone())
        .find_by_name("widget.index")
        .await
        .expect("find")
        .expect("permission");

    grants.grant(role_id, permission.id).await.expect("grant");
    grants
        .grant(role_id, permission.id)
        .await
        .expect("re-grant is a no-op");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM role_permission")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(rows, 1, "double grant must not add rows");
    assert!(grants.is_granted(role_id, permission.id).await.expect("check"));

    grants.revoke(role_id, permission.id).await.expect("revoke");
    grants
        .revoke(role_id, permission.id)
        .await
        .expect("re-revoke is a no-op");
    assert!(!grants.is_granted(role_id, permission.id).await.expect("check"));

    // Revoking a never-granted pair creates no denial row
    let other = PermissionRepository::new(pool.clone())
        .find_by_name("widget.show")
        .await
        .expect("find")
        .expect("permission");
    grants.revoke(role_id, other.id).await.expect("revoke");
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM role_permission")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(rows, 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires a running postgres"]
async fn test_bulk_resource_grant_covers_every_role() {
    let pool = setup().await;
    let sync = synchronizer(&pool);
    sync.sync(&manifest(USERS_MANIFEST)).await.expect("sync");

    let grants = RolePermissionRepository::new(pool.clone());
    let roles = [
        create_role(&pool, "admin").await,
        create_role(&pool, "editor").await,
        create_role(&pool, "viewer").await,
    ];

    // widgets has 3 active permissions after sync; drop one to leave 2
    sqlx::query("UPDATE permissions SET is_active = FALSE WHERE name = 'widget.store'")
        .execute(&pool)
        .await
        .expect("deactivate");

    let updated = grants
        .bulk_set_for_resource("widgets", true)
        .await
        .expect("bulk grant");
    assert_eq!(updated, 3, "all three roles updated");

    let matrix = grants.matrix().await.expect("matrix");
    for role_id in roles {
        let granted = matrix.get(&role_id).expect("role in matrix");
        assert_eq!(granted.len(), 2, "both active widget permissions granted");
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires a running postgres"]
async fn test_bulk_update_rolls_back_on_failure() {
    let pool = setup().await;
    let sync = synchronizer(&pool);
    sync.sync(&manifest(USERS_MANIFEST)).await.expect("sync");

    let grants = RolePermissionRepository::new(pool.clone());
    let role_id = create_role(&pool, "editor").await;
    let permission = PermissionRepository::new(pool.clone())
        .find_by_name("widget.index")
        .await
        .expect("find")
        .expect("permission");
    grants.grant(role_id, permission.id).await.expect("grant");

    let before = grants.matrix().await.expect("matrix");

    // One unknown id poisons the whole batch
    let result = grants
        .bulk_set_for_role(role_id, &[permission.id, Uuid::new_v4()], true)
        .await;
    assert!(matches!(result, Err(RbacError::NotFound(_))));

    let after = grants.matrix().await.expect("matrix");
    assert_eq!(before, after, "failed bulk update must change nothing");
}

#[tokio::test]
#[serial]
#[ignore = "requires a running postgres"]
async fn test_bulk_resource_rolls_back_mid_transaction() {
    let pool = setup().await;
    let sync = synchronizer(&pool);
    sync.sync(&manifest(USERS_MANIFEST)).await.expect("sync");

    let grants = RolePermissionRepository::new(pool.clone());
    let admin = create_role(&pool, "admin").await;
    create_role(&pool, "frozen").await;
    let permission = PermissionRepository::new(pool.clone())
        .find_by_name("widget.index")
        .await
        .expect("find")
        .expect("permission");
    grants.grant(admin, permission.id).await.expect("grant");

    // A row trigger that refuses grants for one role makes the batch fail
    // after other roles' rows have already been written in the same
    // transaction
    sqlx::raw_sql(
        r#"
        DROP TRIGGER IF EXISTS reject_frozen_grants ON role_permission;
        CREATE OR REPLACE FUNCTION reject_frozen_grants() RETURNS trigger AS $$
        BEGIN
            IF (SELECT name FROM roles WHERE id = NEW.role_id) = 'frozen' THEN
                RAISE EXCEPTION 'role is frozen';
            END IF;
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql;
        CREATE TRIGGER reject_frozen_grants
            BEFORE INSERT OR UPDATE ON role_permission
            FOR EACH ROW EXECUTE FUNCTION reject_frozen_grants();
        "#,
    )
    .execute(&pool)
    .await
    .expect("trigger");

    let before = grants.matrix().await.expect("matrix");

    let result = grants.bulk_set_for_resource("widgets", true).await;
    assert!(matches!(result, Err(RbacError::Transaction(_))));

    let after = grants.matrix().await.expect("matrix");
    assert_eq!(before, after, "writes from the failed batch must roll back");

    sqlx::raw_sql(
        "DROP TRIGGER reject_frozen_grants ON role_permission; \
         DROP FUNCTION reject_frozen_grants;",
    )
    .execute(&pool)
    .await
    .expect("drop trigger");
}

#[tokio::test]
#[serial]
#[ignore = "requires a running postgres"]
async fn test_field_overlay_upsert_and_deny_default() {
    let pool = setup().await;
    let fields = FieldPermissionRepository::new(pool.clone());
    let role_id = create_role(&pool, "viewer").await;

    fields
        .set(
            role_id,
            "users",
            "email",
            FieldAccess {
                can_read: true,
                can_write: false,
            },
        )
        .await
        .expect("set");

    // Upsert on the same key flips the flags without adding a row
    fields
        .set(
            role_id,
            "users",
            "email",
            FieldAccess {
                can_read: false,
                can_write: true,
            },
        )
        .await
        .expect("upsert");

    let rows = fields.list_for_role(role_id).await.expect("list");
    assert_eq!(rows.len(), 1);

    let map = fields.permissions_for(role_id, "users").await.expect("map");
    let email = map.get("email").copied().unwrap();
    assert!(!email.can_read);
    assert!(email.can_write);

    // No explicit row means deny on both sides
    assert_eq!(
        rbac::overlay::access_for(&map, "password_hash"),
        FieldAccess::default()
    );
}

#[tokio::test]
#[serial]
#[ignore = "requires a running postgres"]
async fn test_effective_permissions_union_roles_and_direct_grants() {
    let pool = setup().await;
    let sync = synchronizer(&pool);
    sync.sync(&manifest(USERS_MANIFEST)).await.expect("sync");

    let permissions = PermissionRepository::new(pool.clone());
    let grants = RolePermissionRepository::new(pool.clone());
    let users = UserRepository::new(pool.clone());

    let role_id = create_role(&pool, "editor").await;
    let editor = RoleRepository::new(pool.clone())
        .find_by_name("editor")
        .await
        .expect("find role")
        .expect("role");
    assert_eq!(editor.id, role_id);

    let user = users
        .create(&NewUser {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "opaque".to_string(),
        })
        .await
        .expect("user");

    let listed = users.list().await.expect("list users");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, user.id);

    let via_role = permissions
        .find_by_name("widget.index")
        .await
        .expect("find")
        .expect("permission");
    let direct = permissions
        .find_by_name("gadget.index")
        .await
        .expect("find")
        .expect("permission");

    grants.grant(role_id, via_role.id).await.expect("grant");
    users.assign_role(user.id, role_id).await.expect("assign");
    users.grant_direct(user.id, direct.id).await.expect("direct");

    let effective = users
        .effective_permission_names(user.id)
        .await
        .expect("effective");
    let names: Vec<&str> = effective.iter().map(String::as_str).collect();
    assert_eq!(names, vec!["gadget.index", "widget.index"]);

    assert!(users.user_can(user.id, "widget.index").await.expect("can"));
    assert!(users.user_can(user.id, "gadget.index").await.expect("can"));
    assert!(!users.user_can(user.id, "widget.store").await.expect("can"));

    // Dropping either source removes exactly its contribution
    users
        .revoke_direct(user.id, direct.id)
        .await
        .expect("revoke direct");
    assert!(!users.user_can(user.id, "gadget.index").await.expect("can"));

    users.remove_role(user.id, role_id).await.expect("remove");
    let effective = users
        .effective_permission_names(user.id)
        .await
        .expect("effective");
    assert!(effective.is_empty());
}
