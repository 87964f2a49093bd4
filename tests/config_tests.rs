use figment::Jail;

use virtcol::config::FieldKindConfig;
use virtcol::{Config, RedeclarePolicy, Registry};

#[test]
fn defaults_apply_without_file_or_env() {
    Jail::expect_with(|_jail| {
        let cfg = Config::load().expect("config loads");
        assert_eq!(cfg.basic.loglevel, "info");
        assert_eq!(cfg.basic.redeclare, RedeclarePolicy::Overwrite);
        assert_eq!(cfg.database.database, "virtcol_demo");
        assert_eq!(cfg.database.username, "postgres");
        assert_eq!(cfg.database.port, 5432);
        assert!(cfg.models.is_empty());
        Ok(())
    });
}

#[test]
fn toml_file_is_read_and_env_wins() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
            [basic]
            loglevel = "debug"
            redeclare = "reject"

            [database]
            database = "from_file"
            password = 1234
            "#,
        )?;
        jail.set_env("VIRTCOL_DATABASE__DATABASE", "from_env");

        let cfg = Config::load().expect("config loads");
        assert_eq!(cfg.basic.loglevel, "debug");
        assert_eq!(cfg.basic.redeclare, RedeclarePolicy::Reject);
        assert_eq!(cfg.database.database, "from_env");
        assert_eq!(cfg.database.password, "1234");
        assert!(!format!("{:?}", cfg.database).contains("1234"));
        Ok(())
    });
}

#[test]
fn invalid_database_name_is_a_config_error() {
    Jail::expect_with(|jail| {
        jail.set_env("VIRTCOL_DATABASE__DATABASE", "../escape");

        let err = Config::load().unwrap_err();
        assert!(err.to_string().contains("database.database"), "{err}");
        Ok(())
    });
}

#[test]
fn models_table_declares_registry_entries() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
            [[models]]
            name = "Note"
            table = "notebook"
            fields = [
                { name = "title", kind = "column", type = "string", accessible = true },
                { name = "stars", kind = "prop", type = "integer" },
            ]
            "#,
        )?;

        let cfg = Config::load().expect("config loads");
        assert_eq!(cfg.models.len(), 1);
        let note = &cfg.models[0];
        assert_eq!(note.table.as_deref(), Some("notebook"));
        assert_eq!(note.fields[1].kind, FieldKindConfig::Prop);
        assert!(!note.fields[1].accessible);

        let mut registry = Registry::new(cfg.basic.redeclare);
        registry.declare_model(note).expect("model declares");
        assert!(registry.is_registered("Note"));
        assert!(!registry.is_finalized("Note"));
        Ok(())
    });
}

#[test]
fn unknown_field_type_in_config_is_a_schema_error() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
            [[models]]
            name = "Note"
            fields = [{ name = "blob", kind = "prop", type = "binary" }]
            "#,
        )?;

        let cfg = Config::load().expect("config loads");
        let mut registry = Registry::new(cfg.basic.redeclare);
        let err = registry.declare_model(&cfg.models[0]).unwrap_err();
        assert!(err.is_schema(), "{err:?}");
        Ok(())
    });
}
