use vistoria_core::{AppConfig, RegistrationError};
use vistoria_engine::EngineError;
use vistoria_harness::{SharedSite, TestSite};
use vistoria_storage::Storage;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn refusal(result: Result<impl Sized, EngineError>) -> Option<RegistrationError> {
    match result {
        Err(EngineError::Registration(e)) => Some(e),
        _ => None,
    }
}

// ============================================================================
// Administrative account
// ============================================================================

#[test]
fn admin_account_exists_on_first_run() -> TestResult {
    let mut site = TestSite::new()?;
    assert_eq!(site.engine.storage().user_count()?, 1);

    let admin = site.sign_in_admin()?;
    assert_eq!(admin.email, "admin");
    assert_eq!(admin.name, "Admin Master");
    assert!(site.engine.is_admin());
    Ok(())
}

#[test]
fn reopening_never_duplicates_admin() -> TestResult {
    let mut shared = SharedSite::new()?;
    let first = shared.add_engine()?;
    shared.add_engine()?;
    shared.add_engine()?;
    assert_eq!(shared.engine(first).storage().user_count()?, 1);
    Ok(())
}

#[test]
fn admin_identifier_comes_from_config() -> TestResult {
    let mut config = AppConfig::default();
    config.admin.identifier = "gerente@estapar.com.br".into();
    config.admin.initial_password = "s3nha".into();
    let mut site = TestSite::with_config(config)?;

    site.engine.login("Gerente@Estapar.com.br", "s3nha")?;
    assert!(site.engine.is_admin());
    assert!(site.engine.storage().get_user("admin")?.is_none());
    Ok(())
}

#[test]
fn admin_identifier_cannot_be_registered() -> TestResult {
    let mut site = TestSite::new()?;
    let refused = refusal(site.engine.register("Mallory", "admin", "pw"));
    assert_eq!(refused, Some(RegistrationError::ReservedIdentifier("admin".into())));
    assert_eq!(site.engine.storage().user_count()?, 1);
    Ok(())
}

// ============================================================================
// Registration gate
// ============================================================================

#[test]
fn foreign_domain_is_refused() -> TestResult {
    let mut site = TestSite::new()?;
    let refused = refusal(site.engine.register("X", "x@gmail.com", "pw"));
    assert!(matches!(refused, Some(RegistrationError::DomainNotAllowed { .. })));
    assert!(site.engine.current_user().is_none());
    Ok(())
}

#[test]
fn duplicate_email_is_refused() -> TestResult {
    let mut site = TestSite::new()?;
    site.sign_up("Ana", "ana")?;
    site.engine.logout();

    let refused = refusal(site.engine.register("Ana Two", " ANA@estapar.com.br ", "other"));
    assert_eq!(
        refused,
        Some(RegistrationError::EmailTaken("ana@estapar.com.br".into()))
    );
    assert_eq!(site.engine.storage().user_count()?, 2);
    Ok(())
}

#[test]
fn locked_registration_refuses_valid_addresses() -> TestResult {
    let mut site = TestSite::new()?;
    site.sign_in_admin()?;
    site.engine.set_registration_locked(true)?;
    site.engine.logout();

    let refused = refusal(site.engine.register("Ana", "ana@estapar.com.br", "pw"));
    assert_eq!(refused, Some(RegistrationError::Locked));

    site.sign_in_admin()?;
    site.engine.set_registration_locked(false)?;
    site.sign_up("Ana", "ana")?;
    Ok(())
}

#[test]
fn registration_signs_the_new_user_in() -> TestResult {
    let mut site = TestSite::new()?;
    let ana = site.sign_up("Ana", "ana")?;

    assert_eq!(site.engine.current_user(), Some(&ana));
    assert!(!site.engine.is_admin());
    let logins = site.engine.login_history()?;
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].email, "ana@estapar.com.br");
    Ok(())
}

#[test]
fn only_admin_may_lock_registration() -> TestResult {
    let mut site = TestSite::new()?;
    site.sign_up("Ana", "ana")?;
    assert!(matches!(
        site.engine.set_registration_locked(true),
        Err(EngineError::Forbidden(_))
    ));

    site.engine.logout();
    assert!(matches!(
        site.engine.set_registration_locked(true),
        Err(EngineError::Unauthenticated(_))
    ));
    assert!(!site.engine.registration_locked()?);
    Ok(())
}

// ============================================================================
// Login
// ============================================================================

#[test]
fn wrong_password_is_refused_without_history() -> TestResult {
    let mut site = TestSite::new()?;
    site.sign_up("Ana", "ana")?;
    site.engine.logout();

    let result = site.engine.login("ana@estapar.com.br", "wrong");
    assert!(matches!(result, Err(EngineError::InvalidCredentials)));
    let unknown = site.engine.login("bia@estapar.com.br", "pw-bia");
    assert!(matches!(unknown, Err(EngineError::InvalidCredentials)));

    site.engine.login("ana@estapar.com.br", "pw-ana")?;
    assert_eq!(site.engine.login_history()?.len(), 2);
    Ok(())
}

#[test]
fn authenticate_signs_in_without_recording_a_login() -> TestResult {
    let mut site = TestSite::new()?;
    site.sign_up("Ana", "ana")?;
    site.engine.logout();

    let refused = site.engine.authenticate("ana@estapar.com.br", "wrong");
    assert!(matches!(refused, Err(EngineError::InvalidCredentials)));
    assert!(site.engine.current_user().is_none());

    for _ in 0..5 {
        site.engine.authenticate(" ANA@estapar.com.br", "pw-ana")?;
    }
    assert_eq!(site.engine.current_user().map(|a| a.name.as_str()), Some("Ana"));
    let logins = site.engine.login_history()?;
    assert_eq!(logins.len(), 1);

    // The recorded sign-up survives a long run of authenticated actions
    // even with a tight cap.
    let mut config = AppConfig::default();
    config.retention.login_history = 1;
    let mut tight = TestSite::with_config(config)?;
    tight.sign_up("Bia", "bia")?;
    for _ in 0..3 {
        tight.engine.authenticate("admin", "changeme")?;
    }
    let logins = tight.engine.login_history()?;
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].email, "bia@estapar.com.br");
    Ok(())
}

#[test]
fn guests_cannot_read_logs() -> TestResult {
    let mut site = TestSite::new()?;
    site.engine.continue_as_guest();
    assert!(matches!(site.engine.change_log(), Err(EngineError::Unauthenticated(_))));
    assert!(matches!(site.engine.login_history(), Err(EngineError::Unauthenticated(_))));
    Ok(())
}
