use sqlx::{SqliteConnection, SqlitePool};

/// 单个迁移步骤，每个步骤都可以重复执行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    CreateTable {
        table: &'static str,
        ddl: &'static str,
    },
    /// 仅在列不存在时添加，用于升级旧版本创建的库
    AddColumn {
        table: &'static str,
        column: &'static str,
        decl: &'static str,
    },
    CreateIndex {
        index: &'static str,
        ddl: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub step: MigrationStep,
}

/// 按版本号升序排列，只能追加
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        step: MigrationStep::CreateTable {
            table: "users",
            ddl: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL UNIQUE,
                phone TEXT NOT NULL DEFAULT '',
                password TEXT NOT NULL,
                join_date TEXT NOT NULL DEFAULT ''
            )
            "#,
        },
    },
    Migration {
        version: 2,
        name: "create_reports",
        step: MigrationStep::CreateTable {
            table: "reports",
            ddl: r#"
            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_email TEXT NOT NULL,
                result TEXT NOT NULL,
                risk_color TEXT NOT NULL,
                type TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL
            )
            "#,
        },
    },
    Migration {
        version: 3,
        name: "users_add_phone",
        step: MigrationStep::AddColumn {
            table: "users",
            column: "phone",
            decl: "TEXT NOT NULL DEFAULT ''",
        },
    },
    Migration {
        version: 4,
        name: "reports_add_type",
        step: MigrationStep::AddColumn {
            table: "reports",
            column: "type",
            decl: "TEXT NOT NULL DEFAULT ''",
        },
    },
    Migration {
        version: 5,
        name: "reports_by_email_index",
        step: MigrationStep::CreateIndex {
            index: "idx_reports_user_email",
            ddl: "CREATE INDEX IF NOT EXISTS idx_reports_user_email ON reports (user_email, id)",
        },
    },
];

impl MigrationStep {
    /// 步骤作用的表或索引
    pub fn object(&self) -> &'static str {
        match *self {
            MigrationStep::CreateTable { table, .. } | MigrationStep::AddColumn { table, .. } => {
                table
            }
            MigrationStep::CreateIndex { index, .. } => index,
        }
    }

    async fn apply(&self, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
        match *self {
            MigrationStep::CreateTable { ddl, .. } | MigrationStep::CreateIndex { ddl, .. } => {
                sqlx::query(ddl).execute(&mut *conn).await?;
            }
            MigrationStep::AddColumn {
                table,
                column,
                decl,
            } => {
                if !column_exists(&mut *conn, table, column).await? {
                    let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {decl}");
                    sqlx::query(&sql).execute(&mut *conn).await?;
                }
            }
        }
        Ok(())
    }
}

async fn column_exists(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
) -> Result<bool, sqlx::Error> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2")
            .bind(table)
            .bind(column)
            .fetch_one(&mut *conn)
            .await?;
    Ok(count > 0)
}

pub async fn current_version(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
        .fetch_one(pool)
        .await
}

/// 执行所有未应用的迁移，返回本次应用的版本号
pub async fn run_migrations(pool: &SqlitePool) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current = current_version(pool).await?;
    let mut applied = Vec::new();

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let mut tx = pool.begin().await?;
        migration.step.apply(&mut *tx).await?;
        sqlx::query("INSERT INTO schema_version (version, name, applied_at) VALUES (?1, ?2, ?3)")
            .bind(migration.version)
            .bind(migration.name)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(
            version = migration.version,
            name = migration.name,
            object = migration.step.object(),
            "Applied migration"
        );
        applied.push(migration.version);
    }

    Ok(applied)
}
