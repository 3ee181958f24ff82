//! Category management: mapping raw app names to categories and aliases.
//!
//! Categories are presentation metadata only; they never influence parsing
//! or reconstruction.

use std::io::Write;

use anyhow::Result;

use st_db::Database;

pub fn list<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let categories = db.list_categories()?;
    if categories.is_empty() {
        writeln!(writer, "No categories defined.")?;
        return Ok(());
    }
    for mapping in categories {
        match mapping.alias {
            Some(alias) => writeln!(
                writer,
                "{}: {} (shown as {alias})",
                mapping.app_name, mapping.category
            )?,
            None => writeln!(writer, "{}: {}", mapping.app_name, mapping.category)?,
        }
    }
    Ok(())
}

pub fn set(db: &Database, app: &str, category: &str, alias: Option<&str>) -> Result<()> {
    db.set_category(app, category, alias)?;
    match alias {
        Some(alias) => println!("Categorized {app} as {category} (shown as {alias})."),
        None => println!("Categorized {app} as {category}."),
    }
    Ok(())
}

pub fn missing<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let apps = db.uncategorized_apps()?;
    if apps.is_empty() {
        writeln!(writer, "All apps with recorded usage are categorized.")?;
        return Ok(());
    }
    writeln!(writer, "Uncategorized apps (most used first):")?;
    for app in apps {
        writeln!(writer, "- {app}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use st_core::Snapshot;

    fn snapshot(hour: u32, apps: &[(&str, i64)]) -> Snapshot {
        Snapshot {
            timestamp: NaiveDate::from_ymd_opt(2026, 2, 13)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            apps: apps
                .iter()
                .map(|(app, seconds)| ((*app).to_string(), *seconds))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn list_shows_alias_when_present() {
        let db = Database::open_in_memory().unwrap();
        db.set_category("Safari", "Browsing", Some("Web")).unwrap();
        db.set_category("Mail", "Communication", None).unwrap();

        let mut output = Vec::new();
        list(&mut output, &db).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(
            output,
            "Mail: Communication\nSafari: Browsing (shown as Web)\n"
        );
    }

    #[test]
    fn list_with_no_categories() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        list(&mut output, &db).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "No categories defined.\n"
        );
    }

    #[test]
    fn missing_lists_uncategorized_by_usage() {
        let mut db = Database::open_in_memory().unwrap();
        let device = db.get_or_create_device("iPhone").unwrap();
        db.insert_snapshots(
            device,
            "a.txt",
            &[
                snapshot(10, &[("Safari", 0), ("Mail", 0)]),
                snapshot(11, &[("Safari", 100), ("Mail", 900)]),
            ],
        )
        .unwrap();
        db.rebuild_intervals(device).unwrap();

        let mut output = Vec::new();
        missing(&mut output, &db).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(
            output,
            "Uncategorized apps (most used first):\n- Mail\n- Safari\n"
        );
    }

    #[test]
    fn missing_when_everything_is_categorized() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        missing(&mut output, &db).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "All apps with recorded usage are categorized.\n"
        );
    }
}
