//! End-to-end checks against an in-memory directory

use directory::{InMemoryDirectory, ObjectEntry, PrincipalEntry};
use rbac::{build_role_manager, AuthorizationEngine, RightsAggregator, RoleCatalog, RoleManager};
use shared::{
    AccessControlEntry, ActionFlag, DirectoryRights, EngineKind, ErrorKind, ObjectKind, Role,
    RoleConfig,
};
use std::sync::Arc;
use std::thread;

fn reader_writer_catalog() -> RoleCatalog {
    RoleCatalog::new(vec![
        Role::new("Reader")
            .with_rights(DirectoryRights::READ_PROPERTY)
            .with_actions(ActionFlag::GET),
        Role::new("Writer")
            .with_rights(DirectoryRights::READ_PROPERTY | DirectoryRights::WRITE_PROPERTY)
            .with_actions(ActionFlag::MODIFY)
            .extends("Reader"),
    ])
    .unwrap()
}

fn corp_directory() -> Arc<InMemoryDirectory> {
    let dir = InMemoryDirectory::new();
    dir.add_principal(PrincipalEntry::new("S-G-DOMAIN-ADMINS", "Domain Admins")).unwrap();
    dir.add_principal(PrincipalEntry::new("S-G-AUDITORS", "Auditors")).unwrap();
    dir.add_principal(
        PrincipalEntry::new("S-U-JUDY", "judy")
            .with_upn("judy@corp.local")
            .member_of("S-G-AUDITORS"),
    )
    .unwrap();
    dir.add_principal(PrincipalEntry::new("S-U-KARL", "karl").member_of("S-G-DOMAIN-ADMINS")).unwrap();
    dir.add_object(
        ObjectEntry::new("ou-hr", "OU=HR,DC=corp,DC=local", ObjectKind::OrganizationalUnit)
            .with_ace(AccessControlEntry::allow("S-G-AUDITORS", DirectoryRights::READ_PROPERTY))
            .with_ace(AccessControlEntry::allow("S-G-DOMAIN-ADMINS", DirectoryRights::GENERIC_ALL)),
    )
    .unwrap();
    Arc::new(dir)
}

#[test]
fn test_reader_writer_scenario() {
    let catalog = Arc::new(reader_writer_catalog());
    assert_eq!(
        catalog.roles_allowing_action(ActionFlag::GET),
        &["Reader".to_string(), "Writer".to_string()]
    );

    let engine = AuthorizationEngine::new(catalog, corp_directory());
    assert!(engine.can_perform_action("judy", ActionFlag::GET, "ou-hr").unwrap());
    assert!(!engine.can_perform_action("judy", ActionFlag::MODIFY, "ou-hr").unwrap());
}

#[test]
fn test_generic_all_grant_and_revoke_round_trip() {
    let dir = corp_directory();
    let aggregator = RightsAggregator::new(dir.clone());
    assert_eq!(
        aggregator.compute_effective_rights("karl", "ou-hr").unwrap(),
        DirectoryRights::GENERIC_ALL
    );

    let manager = rbac::CatalogRoleManager::new(reader_writer_catalog(), dir.clone());
    let before = dir.aces("ou-hr").unwrap();

    manager.add_role("judy@corp.local", "Writer", "ou-hr").unwrap();
    assert_eq!(dir.aces("ou-hr").unwrap().len(), before.len() + 1);

    manager.remove_role("judy@corp.local", "Writer", "ou-hr").unwrap();
    assert_eq!(dir.aces("ou-hr").unwrap(), before);
}

#[test]
fn test_unknown_role_grant_is_rejected_without_mutation() {
    let dir = corp_directory();
    let manager = rbac::CatalogRoleManager::new(reader_writer_catalog(), dir.clone());
    let before = dir.aces("ou-hr").unwrap();

    let err = manager.add_role("judy", "UnknownRole", "ou-hr").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DoesNotExist);
    assert!(err.to_string().contains("Reader, Writer"));
    assert_eq!(dir.aces("ou-hr").unwrap(), before);
    assert_eq!(dir.write_count(), 0);
}

#[test]
fn test_deny_on_nested_group_overrides_allow() {
    let dir = corp_directory();
    dir.add_principal(PrincipalEntry::new("S-G-CONTRACTORS", "Contractors").member_of("S-G-AUDITORS")).unwrap();
    dir.add_principal(PrincipalEntry::new("S-U-LIAM", "liam").member_of("S-G-CONTRACTORS")).unwrap();
    dir.push_ace("ou-hr", AccessControlEntry::deny("S-G-CONTRACTORS", DirectoryRights::READ_PROPERTY)).unwrap();

    let engine = AuthorizationEngine::new(Arc::new(reader_writer_catalog()), dir);

    // liam reaches Auditors through Contractors, but the deny cancels the read
    assert!(!engine.can_perform_action("liam", ActionFlag::GET, "ou-hr").unwrap());
    assert!(engine.can_perform_action("judy", ActionFlag::GET, "ou-hr").unwrap());
}

#[test]
fn test_inherited_aces_count_towards_effective_rights() {
    let dir = corp_directory();
    dir.add_principal(PrincipalEntry::new("S-G-HR-EDITORS", "HR Editors")).unwrap();
    dir.add_principal(PrincipalEntry::new("S-U-MIA", "mia").member_of("S-G-HR-EDITORS")).unwrap();
    dir.push_ace(
        "ou-hr",
        AccessControlEntry::allow(
            "S-G-HR-EDITORS",
            DirectoryRights::READ_PROPERTY | DirectoryRights::WRITE_PROPERTY,
        )
        .inherited(),
    )
    .unwrap();

    let engine = AuthorizationEngine::new(Arc::new(reader_writer_catalog()), dir);
    assert_eq!(
        engine.matching_role("mia", ActionFlag::MODIFY, "ou-hr").unwrap(),
        Some("Writer")
    );
}

#[test]
fn test_config_driven_manager_over_threads() {
    let config = RoleConfig::from_yaml(
        r#"
roles:
  - name: Reader
    requiredRights: READ_PROPERTY
    allowedActions: [GET, SEARCH]
  - name: Admin
    requiredRights: GENERIC_ALL
    allowedActions: 16383
"#,
    )
    .unwrap();
    let manager: Arc<dyn RoleManager> = build_role_manager(&config, corp_directory()).unwrap();
    assert_eq!(manager.kind(), EngineKind::Catalog);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let (principal, action, expected) = if i % 2 == 0 {
                    ("judy", ActionFlag::SEARCH, true)
                } else {
                    ("judy", ActionFlag::DELETE, false)
                };
                assert_eq!(manager.can_perform_action(principal, action, "ou-hr").unwrap(), expected);
                assert!(manager.can_perform_action("karl", ActionFlag::REMOVE_ROLE, "ou-hr").unwrap());
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_unsupported_object_kind() {
    let dir = corp_directory();
    dir.add_object(ObjectEntry::new(
        "contact-1",
        "CN=Vendor,OU=Contacts,DC=corp,DC=local",
        ObjectKind::Other("contact".to_string()),
    ))
    .unwrap();
    let engine = AuthorizationEngine::new(Arc::new(reader_writer_catalog()), dir);

    let err = engine.can_perform_action("judy", ActionFlag::GET, "contact-1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotSupported);
}
