//! Catalog store operations.

use rusqlite::{params, params_from_iter, OptionalExtension};
use rust_decimal::Decimal;

use super::{Database, DbError, DbResult};
use crate::models::LabTest;

impl Database {
    /// Insert a new lab test.
    pub fn insert_test(&self, test: &LabTest) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO lab_tests (
                id, name, price, category, description, active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                test.id,
                test.name,
                test.price.to_string(),
                test.category,
                test.description,
                test.active,
                test.created_at,
                test.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing lab test.
    pub fn update_test(&self, test: &LabTest) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE lab_tests SET
                name = ?2,
                price = ?3,
                category = ?4,
                description = ?5,
                active = ?6,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                test.id,
                test.name,
                test.price.to_string(),
                test.category,
                test.description,
                test.active,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a lab test by id.
    pub fn find_test(&self, id: &str) -> DbResult<Option<LabTest>> {
        let result = self
            .conn
            .query_row(
                r#"
                SELECT id, name, price, category, description, active,
                       created_at, updated_at
                FROM lab_tests
                WHERE id = ?
                "#,
                [id],
                map_test_row,
            )
            .optional()?;

        result.map(|row| row.try_into()).transpose()
    }

    /// Resolve a set of ids against the catalog. Unknown ids yield no row;
    /// repeated ids yield one. Active and inactive tests both resolve.
    pub fn find_tests_by_ids(&self, ids: &[String]) -> DbResult<Vec<LabTest>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT id, name, price, category, description, active,
                   created_at, updated_at
            FROM lab_tests
            WHERE id IN ({})
            ORDER BY name
            "#,
            placeholders
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), map_test_row)?;

        let mut tests = Vec::new();
        for row in rows {
            tests.push(row?.try_into()?);
        }
        Ok(tests)
    }

    /// List catalog entries, optionally only the publicly-listed ones.
    pub fn list_tests(&self, active_only: bool) -> DbResult<Vec<LabTest>> {
        let sql = if active_only {
            r#"
            SELECT id, name, price, category, description, active,
                   created_at, updated_at
            FROM lab_tests
            WHERE active = 1
            ORDER BY name
            "#
        } else {
            r#"
            SELECT id, name, price, category, description, active,
                   created_at, updated_at
            FROM lab_tests
            ORDER BY name
            "#
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], map_test_row)?;

        let mut tests = Vec::new();
        for row in rows {
            tests.push(row?.try_into()?);
        }
        Ok(tests)
    }

    /// Delete a lab test.
    pub fn delete_test(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM lab_tests WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Count catalog rows (seed guard).
    pub fn count_tests(&self) -> DbResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM lab_tests", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Intermediate row struct for database mapping.
struct TestRow {
    id: String,
    name: String,
    price: String,
    category: Option<String>,
    description: Option<String>,
    active: bool,
    created_at: String,
    updated_at: String,
}

fn map_test_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TestRow> {
    Ok(TestRow {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        category: row.get(3)?,
        description: row.get(4)?,
        active: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl TryFrom<TestRow> for LabTest {
    type Error = DbError;

    fn try_from(row: TestRow) -> Result<Self, Self::Error> {
        Ok(LabTest {
            id: row.id,
            name: row.name,
            price: row.price.parse::<Decimal>()?,
            category: row.category,
            description: row.description,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_test(name: &str, price: i64) -> LabTest {
        LabTest::new(name.into(), Decimal::new(price * 100, 2))
    }

    #[test]
    fn test_insert_and_find() {
        let db = setup_db();

        let mut test = make_test("CBC / Hemogram", 250);
        test.category = Some("Hematology".into());
        db.insert_test(&test).unwrap();

        let retrieved = db.find_test(&test.id).unwrap().unwrap();
        assert_eq!(retrieved.name, "CBC / Hemogram");
        assert_eq!(retrieved.price, Decimal::new(250_00, 2));
        assert_eq!(retrieved.category, Some("Hematology".into()));
    }

    #[test]
    fn test_find_by_ids_drops_unknown_and_dedups() {
        let db = setup_db();

        let cbc = make_test("CBC / Hemogram", 250);
        let lipid = make_test("Lipid Profile", 600);
        db.insert_test(&cbc).unwrap();
        db.insert_test(&lipid).unwrap();

        let ids = vec![
            cbc.id.clone(),
            "no-such-test".to_string(),
            cbc.id.clone(),
            lipid.id.clone(),
        ];
        let resolved = db.find_tests_by_ids(&ids).unwrap();
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_find_by_ids_empty_input() {
        let db = setup_db();
        assert!(db.find_tests_by_ids(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_inactive_resolves_by_id_but_not_listed() {
        let db = setup_db();

        let mut widal = make_test("Widal", 200);
        widal.active = false;
        db.insert_test(&widal).unwrap();

        assert!(db.list_tests(true).unwrap().is_empty());
        assert_eq!(db.list_tests(false).unwrap().len(), 1);
        assert_eq!(db.find_tests_by_ids(&[widal.id.clone()]).unwrap().len(), 1);
    }

    #[test]
    fn test_update_and_delete() {
        let db = setup_db();

        let mut test = make_test("Urine Routine", 150);
        db.insert_test(&test).unwrap();

        test.price = Decimal::new(180_00, 2);
        test.active = false;
        assert!(db.update_test(&test).unwrap());

        let retrieved = db.find_test(&test.id).unwrap().unwrap();
        assert_eq!(retrieved.price, Decimal::new(180_00, 2));
        assert!(!retrieved.active);

        assert!(db.delete_test(&test.id).unwrap());
        assert!(db.find_test(&test.id).unwrap().is_none());
        assert!(!db.delete_test(&test.id).unwrap());
    }

    #[test]
    fn test_count_tests() {
        let db = setup_db();
        assert_eq!(db.count_tests().unwrap(), 0);

        db.insert_test(&make_test("Widal", 200)).unwrap();
        assert_eq!(db.count_tests().unwrap(), 1);
    }
}
