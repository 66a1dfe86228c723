use std::env;

use serial_test::serial;

use gbm_release::config::Config;

fn clear_env() {
    for key in [
        "GBM_WPMOBILE_ORG",
        "GBM_WORDPRESS_ORG",
        "GBM_AUTOMATTIC_ORG",
        "GBM_NO_WORKSPACE",
        "CI",
    ] {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_without_any_environment() {
    clear_env();
    let config = Config::from_env().unwrap();
    assert_eq!(config.org_for("gutenberg").unwrap(), "WordPress");
    assert_eq!(config.org_for("gutenberg-mobile").unwrap(), "wordpress-mobile");
    assert_eq!(config.org_for("jetpack").unwrap(), "Automattic");
    assert!(!config.assume_yes);
    assert!(!config.no_workspace);
}

#[test]
#[serial]
fn org_env_vars_override_the_defaults() {
    clear_env();
    env::set_var("GBM_WPMOBILE_ORG", "my-fork");
    env::set_var("GBM_WORDPRESS_ORG", "my-wp-fork");

    let config = Config::from_env().unwrap();
    assert_eq!(config.org_for("gutenberg-mobile").unwrap(), "my-fork");
    assert_eq!(config.org_for("WordPress-Android").unwrap(), "my-fork");
    assert_eq!(config.org_for("gutenberg").unwrap(), "my-wp-fork");
    // untouched org keeps its default
    assert_eq!(config.org_for("jetpack").unwrap(), "Automattic");

    clear_env();
}

#[test]
#[serial]
fn ci_enables_assume_yes() {
    clear_env();
    env::set_var("CI", "true");
    assert!(Config::from_env().unwrap().assume_yes);

    env::set_var("CI", "false");
    assert!(!Config::from_env().unwrap().assume_yes);

    clear_env();
}

#[test]
#[serial]
fn no_workspace_env_is_presence_based() {
    clear_env();
    env::set_var("GBM_NO_WORKSPACE", "1");
    assert!(Config::from_env().unwrap().no_workspace);

    clear_env();
}
