//! Credential store operations: users, roles, and their assignments.

use std::collections::BTreeSet;

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Role, User};

impl Database {
    /// Insert a new user with its role assignments.
    ///
    /// The username UNIQUE constraint is the arbiter for concurrent
    /// registrations of the same name; a violation surfaces as
    /// [`DbError::Constraint`].
    pub fn insert_user(&self, user: &User) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO users (
                    id, username, password_hash, enabled, full_name, age,
                    gender, address, phone_number, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    user.id,
                    user.username,
                    user.password_hash,
                    user.enabled,
                    user.full_name,
                    user.age,
                    user.gender,
                    user.address,
                    user.phone_number,
                    user.created_at,
                    user.updated_at,
                ],
            )
            .map_err(constraint_or_sqlite)?;

        for role in &user.roles {
            self.conn.execute(
                "INSERT OR IGNORE INTO user_roles (user_id, role_name) VALUES (?1, ?2)",
                params![user.id, role.name()],
            )?;
        }
        Ok(())
    }

    /// Update a user's mutable columns. Role assignments are untouched.
    pub fn update_user(&self, user: &User) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE users SET
                password_hash = ?2,
                enabled = ?3,
                full_name = ?4,
                age = ?5,
                gender = ?6,
                address = ?7,
                phone_number = ?8,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                user.id,
                user.password_hash,
                user.enabled,
                user.full_name,
                user.age,
                user.gender,
                user.address,
                user.phone_number,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Look up a user by username, role set included.
    pub fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, username, password_hash, enabled, full_name, age,
                       gender, address, phone_number, created_at, updated_at
                FROM users
                WHERE username = ?
                "#,
                [username],
                map_user_row,
            )
            .optional()?;

        match row {
            Some(mut user) => {
                user.roles = self.roles_for_user(&user.id)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Check whether a username is taken.
    pub fn user_exists(&self, username: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?",
            [username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List all users, role sets included.
    pub fn list_users(&self) -> DbResult<Vec<User>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, username, password_hash, enabled, full_name, age,
                   gender, address, phone_number, created_at, updated_at
            FROM users
            ORDER BY username
            "#,
        )?;
        let rows = stmt.query_map([], map_user_row)?;

        let mut users = Vec::new();
        for row in rows {
            let mut user = row?;
            user.roles = self.roles_for_user(&user.id)?;
            users.push(user);
        }
        Ok(users)
    }

    /// Look up a reference role by name (normalized before matching).
    pub fn find_role(&self, name: &str) -> DbResult<Option<Role>> {
        let normalized = Role::new(name);
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM roles WHERE name = ?",
                [normalized.name()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.map(|n| Role::new(&n)))
    }

    /// Insert a reference role if absent.
    pub fn insert_role(&self, role: &Role) -> DbResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO roles (name) VALUES (?)",
            [role.name()],
        )?;
        Ok(())
    }

    fn roles_for_user(&self, user_id: &str) -> DbResult<BTreeSet<Role>> {
        let mut stmt = self
            .conn
            .prepare("SELECT role_name FROM user_roles WHERE user_id = ?")?;
        let rows = stmt.query_map([user_id], |row| row.get::<_, String>(0))?;

        let mut roles = BTreeSet::new();
        for row in rows {
            roles.insert(Role::new(&row?));
        }
        Ok(roles)
    }
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        enabled: row.get(3)?,
        full_name: row.get(4)?,
        age: row.get(5)?,
        gender: row.get(6)?,
        address: row.get(7)?,
        phone_number: row.get(8)?,
        roles: BTreeSet::new(),
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn constraint_or_sqlite(e: rusqlite::Error) -> DbError {
    match e {
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(msg.unwrap_or_else(|| "constraint violation".into()))
        }
        other => DbError::Sqlite(other),
    }
}
