use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use crate::models::{Address, AddressKind, AddressPredicate, Coordinates, User, UserId};
use crate::services::store::{AddressStore, StoreError};

/// Columns shared by every user query; addresses are joined in flattened
const USER_COLUMNS: &str = r#"
        u.id, u.first_name, u.last_name, u.email, u.phone, u.role,
        u.willing_to_take, u.has_drivers_license, u.profile_path, u.created_at,
        h.user_id IS NOT NULL AS has_home,
        h.street AS home_street, h.city AS home_city, h.zipcode AS home_zipcode,
        h.latitude AS home_latitude, h.longitude AS home_longitude,
        c.user_id IS NOT NULL AS has_company,
        c.office_name AS company_office_name,
        c.street AS company_street, c.city AS company_city, c.zipcode AS company_zipcode,
        c.latitude AS company_latitude, c.longitude AS company_longitude
"#;

const USER_JOINS: &str = r#"
    FROM users u
    LEFT JOIN home_addresses h ON h.user_id = u.id
    LEFT JOIN company_addresses c ON c.user_id = u.id
"#;

/// Geography expression the GiST indexes are built on; keep queries identical
const HOME_POINT: &str = "geography(ST_SetSRID(ST_MakePoint(h.longitude, h.latitude), 4326))";
const COMPANY_POINT: &str = "geography(ST_SetSRID(ST_MakePoint(c.longitude, c.latitude), 4326))";

// SQLSTATE codes
const UNDEFINED_FUNCTION: &str = "42883";
const UNDEFINED_OBJECT: &str = "42704";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL address store
///
/// Radius queries need the PostGIS extension. Its presence is checked once at
/// connect time and reported through `spatial_search_available`; exact-match
/// queries work on plain Postgres.
pub struct PostgresStore {
    pool: PgPool,
    spatial: bool,
}

impl PostgresStore {
    /// Create a new store from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        let spatial = Self::probe_spatial(&pool).await?;

        Ok(Self { pool, spatial })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Check for PostGIS and make sure the spatial indexes exist
    async fn probe_spatial(pool: &PgPool) -> Result<bool, StoreError> {
        let installed: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pg_extension WHERE extname = 'postgis')",
        )
        .fetch_one(pool)
        .await?;

        if !installed {
            tracing::warn!("PostGIS is not installed; radius search disabled");
            return Ok(false);
        }

        for statement in [
            "CREATE INDEX IF NOT EXISTS home_addresses_geog_idx ON home_addresses \
             USING GIST ((geography(ST_SetSRID(ST_MakePoint(longitude, latitude), 4326))))",
            "CREATE INDEX IF NOT EXISTS company_addresses_geog_idx ON company_addresses \
             USING GIST ((geography(ST_SetSRID(ST_MakePoint(longitude, latitude), 4326))))",
        ] {
            sqlx::query(statement).execute(pool).await?;
        }

        tracing::info!("PostGIS detected; radius search enabled");
        Ok(true)
    }
}

/// Build a user from a row selecting `USER_COLUMNS`
fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    let home_address = if row.try_get::<bool, _>("has_home")? {
        Some(Address {
            office_name: None,
            street: row.try_get("home_street")?,
            city: row.try_get("home_city")?,
            zipcode: row.try_get("home_zipcode")?,
            coordinates: coordinates(row.try_get("home_latitude")?, row.try_get("home_longitude")?),
        })
    } else {
        None
    };

    let company_address = if row.try_get::<bool, _>("has_company")? {
        Some(Address {
            office_name: row.try_get("company_office_name")?,
            street: row.try_get("company_street")?,
            city: row.try_get("company_city")?,
            zipcode: row.try_get("company_zipcode")?,
            coordinates: coordinates(
                row.try_get("company_latitude")?,
                row.try_get("company_longitude")?,
            ),
        })
    } else {
        None
    };

    Ok(User {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        role: row.try_get("role")?,
        willing_to_take: row.try_get("willing_to_take")?,
        has_drivers_license: row.try_get("has_drivers_license")?,
        profile_path: row.try_get("profile_path")?,
        home_address,
        company_address,
        created_at: row.try_get("created_at")?,
    })
}

#[inline]
fn coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinates> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
        _ => None,
    }
}

/// WHERE clause (after the self-exclusion on `$1`) for an exact-match predicate
fn predicate_clause(predicate: &AddressPredicate) -> &'static str {
    match predicate {
        AddressPredicate::OfficeName(_) => "lower(btrim(c.office_name)) = lower(btrim($2))",
        AddressPredicate::StreetAndCity { city: Some(_), .. } => {
            "lower(btrim(c.street)) = lower(btrim($2)) AND lower(btrim(c.city)) = lower(btrim($3))"
        }
        AddressPredicate::StreetAndCity { city: None, .. } => {
            "lower(btrim(c.street)) = lower(btrim($2)) AND coalesce(btrim(c.city), '') = ''"
        }
        AddressPredicate::City(_) => "lower(btrim(c.city)) = lower(btrim($2))",
        AddressPredicate::HasCompanyAddress => "c.user_id IS NOT NULL",
    }
}

fn is_spatial_failure(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(
            db.code().as_deref(),
            Some(UNDEFINED_FUNCTION) | Some(UNDEFINED_OBJECT)
        ),
        _ => false,
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION),
        _ => false,
    }
}

#[async_trait]
impl AddressStore for PostgresStore {
    async fn get_user_with_addresses(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {} {} WHERE u.id = $1", USER_COLUMNS, USER_JOINS);

        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn find_users_by_predicate(
        &self,
        predicate: &AddressPredicate,
        exclude_id: UserId,
    ) -> Result<Vec<User>, StoreError> {
        let query = format!(
            "SELECT {} {} WHERE u.id <> $1 AND c.user_id IS NOT NULL AND {} ORDER BY u.id",
            USER_COLUMNS,
            USER_JOINS,
            predicate_clause(predicate)
        );

        let mut sql = sqlx::query(&query).bind(exclude_id);
        sql = match predicate {
            AddressPredicate::OfficeName(name) => sql.bind(name),
            AddressPredicate::StreetAndCity { street, city } => {
                let sql = sql.bind(street);
                match city {
                    Some(city) => sql.bind(city),
                    None => sql,
                }
            }
            AddressPredicate::City(city) => sql.bind(city),
            AddressPredicate::HasCompanyAddress => sql,
        };

        let rows = sql.fetch_all(&self.pool).await?;

        let users = rows
            .iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Predicate {:?} matched {} users", predicate, users.len());

        Ok(users)
    }

    async fn find_users_within_radius(
        &self,
        center: Coordinates,
        radius_meters: f64,
        exclude_id: UserId,
        kind: AddressKind,
        limit: usize,
    ) -> Result<Vec<(User, f64)>, StoreError> {
        if !self.spatial {
            return Err(StoreError::SpatialUnavailable("PostGIS is not installed".to_string()));
        }

        let (point, alias) = match kind {
            AddressKind::Home => (HOME_POINT, "h"),
            AddressKind::Company => (COMPANY_POINT, "c"),
        };
        let center_sql = "geography(ST_SetSRID(ST_MakePoint($2, $1), 4326))";

        let query = format!(
            r#"
            SELECT {columns}, ST_Distance({point}, {center}) AS distance_meters
            {joins}
            WHERE u.id <> $3
              AND {alias}.latitude IS NOT NULL
              AND {alias}.longitude IS NOT NULL
              AND ST_DWithin({point}, {center}, $4)
            ORDER BY distance_meters ASC, u.id ASC
            LIMIT $5
            "#,
            columns = USER_COLUMNS,
            joins = USER_JOINS,
            point = point,
            center = center_sql,
            alias = alias,
        );

        let rows = sqlx::query(&query)
            .bind(center.latitude)
            .bind(center.longitude)
            .bind(exclude_id)
            .bind(radius_meters)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                if is_spatial_failure(&e) {
                    StoreError::SpatialUnavailable(e.to_string())
                } else {
                    StoreError::SqlxError(e)
                }
            })?;

        let hits = rows
            .iter()
            .map(|row| Ok((user_from_row(row)?, row.try_get::<f64, _>("distance_meters")?)))
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        tracing::debug!(
            "Radius query ({} address, {:.0} m) returned {} users",
            kind,
            radius_meters,
            hits.len()
        );

        Ok(hits)
    }

    fn spatial_search_available(&self) -> bool {
        self.spatial
    }

    async fn upsert_address(
        &self,
        user_id: UserId,
        kind: AddressKind,
        address: &Address,
    ) -> Result<(), StoreError> {
        let (latitude, longitude) = match address.coordinates {
            Some(point) => (Some(point.latitude), Some(point.longitude)),
            None => (None, None),
        };

        let result = match kind {
            AddressKind::Home => {
                sqlx::query(
                    r#"
                    INSERT INTO home_addresses (user_id, street, city, zipcode, latitude, longitude, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, NOW())
                    ON CONFLICT (user_id)
                    DO UPDATE SET
                        street = EXCLUDED.street,
                        city = EXCLUDED.city,
                        zipcode = EXCLUDED.zipcode,
                        latitude = EXCLUDED.latitude,
                        longitude = EXCLUDED.longitude,
                        updated_at = EXCLUDED.updated_at
                    "#,
                )
                .bind(user_id)
                .bind(&address.street)
                .bind(&address.city)
                .bind(&address.zipcode)
                .bind(latitude)
                .bind(longitude)
                .execute(&self.pool)
                .await
            }
            AddressKind::Company => {
                sqlx::query(
                    r#"
                    INSERT INTO company_addresses (user_id, office_name, street, city, zipcode, latitude, longitude, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
                    ON CONFLICT (user_id)
                    DO UPDATE SET
                        office_name = EXCLUDED.office_name,
                        street = EXCLUDED.street,
                        city = EXCLUDED.city,
                        zipcode = EXCLUDED.zipcode,
                        latitude = EXCLUDED.latitude,
                        longitude = EXCLUDED.longitude,
                        updated_at = EXCLUDED.updated_at
                    "#,
                )
                .bind(user_id)
                .bind(&address.office_name)
                .bind(&address.street)
                .bind(&address.city)
                .bind(&address.zipcode)
                .bind(latitude)
                .bind(longitude)
                .execute(&self.pool)
                .await
            }
        };

        match result {
            Ok(_) => {
                tracing::debug!("Upserted {} address for user {}", kind, user_id);
                Ok(())
            }
            Err(e) if is_foreign_key_violation(&e) => {
                Err(StoreError::NotFound(format!("user {}", user_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_coordinates_if_unchanged(
        &self,
        user_id: UserId,
        kind: AddressKind,
        expected: &Address,
        coordinates: Coordinates,
    ) -> Result<bool, StoreError> {
        let table = match kind {
            AddressKind::Home => "home_addresses",
            AddressKind::Company => "company_addresses",
        };

        let query = format!(
            r#"
            UPDATE {table}
            SET latitude = $5, longitude = $6, updated_at = NOW()
            WHERE user_id = $1
              AND street IS NOT DISTINCT FROM $2
              AND city IS NOT DISTINCT FROM $3
              AND zipcode IS NOT DISTINCT FROM $4
            "#
        );

        let result = sqlx::query(&query)
            .bind(user_id)
            .bind(&expected.street)
            .bind(&expected.city)
            .bind(&expected.zipcode)
            .bind(coordinates.latitude)
            .bind(coordinates.longitude)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_ungeocoded_addresses(
        &self,
        limit: usize,
    ) -> Result<Vec<(UserId, AddressKind, Address)>, StoreError> {
        let query = r#"
            SELECT user_id, kind, office_name, street, city, zipcode FROM (
                SELECT user_id, 'home' AS kind, NULL::text AS office_name, street, city, zipcode
                FROM home_addresses
                WHERE latitude IS NULL
                UNION ALL
                SELECT user_id, 'company' AS kind, office_name, street, city, zipcode
                FROM company_addresses
                WHERE latitude IS NULL
            ) pending
            WHERE coalesce(btrim(street), '') <> ''
               OR coalesce(btrim(city), '') <> ''
               OR coalesce(btrim(zipcode), '') <> ''
            ORDER BY user_id ASC, kind DESC
            LIMIT $1
        "#;

        let rows = sqlx::query(query)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let pending = rows
            .iter()
            .map(|row| {
                let kind = match row.try_get::<String, _>("kind")?.as_str() {
                    "home" => AddressKind::Home,
                    _ => AddressKind::Company,
                };
                Ok((
                    row.try_get("user_id")?,
                    kind,
                    Address {
                        office_name: row.try_get("office_name")?,
                        street: row.try_get("street")?,
                        city: row.try_get("city")?,
                        zipcode: row.try_get("zipcode")?,
                        coordinates: None,
                    },
                ))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(pending)
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
