use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::errors::{AppError, StoreError};
use crate::domain::repositories::{UserEdit, UserRepository};
use crate::domain::user::{Account, Email, Location, ProviderProfile, User};

/// PostgreSQL implementation of UserRepository
///
/// Provider attributes live in `provider_profiles`, joined on read.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new PostgresUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_USER: &str = r#"
    SELECT u.id, u.email, u.password_hash, u.name, u.profile_image_url, u.phone_number,
           u.is_active, u.created_at,
           p.document_type, p.document_number, p.speciality, p.description,
           p.address, p.city, p.state, p.zip_code,
           p.categories, p.subcategories, p.portfolio_images,
           p.plan_type, p.plan_status, p.documents_verified
    FROM users u
    LEFT JOIN provider_profiles p ON p.user_id = u.id
"#;

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: String,
    profile_image_url: Option<String>,
    phone_number: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    document_type: Option<String>,
    document_number: Option<String>,
    speciality: Option<String>,
    description: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    categories: Option<Vec<String>>,
    subcategories: Option<Vec<String>>,
    portfolio_images: Option<Vec<String>>,
    plan_type: Option<String>,
    plan_status: Option<String>,
    documents_verified: Option<bool>,
}

fn corrupt(what: &str, e: String) -> StoreError {
    StoreError::Database(format!("Invalid {} from database: {}", what, e))
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let email = Email::new(&r.email).map_err(|e| corrupt("email", e))?;

        let account = match (r.document_type, r.plan_type, r.plan_status) {
            (Some(document_type), Some(plan_type), Some(plan_status)) => {
                Account::Provider(ProviderProfile {
                    document_type: document_type.parse().map_err(|e| corrupt("document type", e))?,
                    document_number: r.document_number.unwrap_or_default(),
                    speciality: r.speciality,
                    description: r.description,
                    location: Location {
                        address: r.address.unwrap_or_default(),
                        city: r.city.unwrap_or_default(),
                        state: r.state.unwrap_or_default(),
                        zip_code: r.zip_code.unwrap_or_default(),
                    },
                    categories: r.categories.unwrap_or_default().into_iter().collect(),
                    subcategories: r.subcategories.unwrap_or_default(),
                    portfolio_images: r.portfolio_images.unwrap_or_default(),
                    plan_type: plan_type.parse().map_err(|e| corrupt("plan type", e))?,
                    plan_status: plan_status.parse().map_err(|e| corrupt("plan status", e))?,
                    documents_verified: r.documents_verified.unwrap_or(false),
                })
            }
            _ => Account::Viewer,
        };

        Ok(User {
            id: r.id,
            email,
            password_hash: r.password_hash,
            name: r.name,
            profile_image_url: r.profile_image_url,
            phone_number: r.phone_number,
            is_active: r.is_active,
            created_at: r.created_at,
            account,
        })
    }
}

async fn write_user(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user: &User,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET email = $2, password_hash = $3, name = $4, profile_image_url = $5,
            phone_number = $6, is_active = $7, user_type = $8, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user.id)
    .bind(user.email.as_str())
    .bind(&user.password_hash)
    .bind(&user.name)
    .bind(&user.profile_image_url)
    .bind(&user.phone_number)
    .bind(user.is_active)
    .bind(user.user_type().to_string())
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }

    match user.provider() {
        Some(profile) => upsert_profile(tx, user.id, profile).await,
        None => {
            sqlx::query("DELETE FROM provider_profiles WHERE user_id = $1")
                .bind(user.id)
                .execute(&mut **tx)
                .await?;
            Ok(())
        }
    }
}

async fn upsert_profile(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    profile: &ProviderProfile,
) -> Result<(), StoreError> {
    let categories: Vec<String> = profile.categories.iter().cloned().collect();

    sqlx::query(
        r#"
        INSERT INTO provider_profiles (
            user_id, document_type, document_number, speciality, description,
            address, city, state, zip_code, categories, subcategories, portfolio_images,
            plan_type, plan_status, documents_verified
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT (user_id) DO UPDATE SET
            document_type = EXCLUDED.document_type,
            document_number = EXCLUDED.document_number,
            speciality = EXCLUDED.speciality,
            description = EXCLUDED.description,
            address = EXCLUDED.address,
            city = EXCLUDED.city,
            state = EXCLUDED.state,
            zip_code = EXCLUDED.zip_code,
            categories = EXCLUDED.categories,
            subcategories = EXCLUDED.subcategories,
            portfolio_images = EXCLUDED.portfolio_images,
            plan_type = EXCLUDED.plan_type,
            plan_status = EXCLUDED.plan_status,
            documents_verified = EXCLUDED.documents_verified
        "#,
    )
    .bind(user_id)
    .bind(profile.document_type.to_string())
    .bind(&profile.document_number)
    .bind(&profile.speciality)
    .bind(&profile.description)
    .bind(&profile.location.address)
    .bind(&profile.location.city)
    .bind(&profile.location.state)
    .bind(&profile.location.zip_code)
    .bind(&categories)
    .bind(&profile.subcategories)
    .bind(&profile.portfolio_images)
    .bind(profile.plan_type.to_string())
    .bind(profile.plan_status.to_string())
    .bind(profile.documents_verified)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> Result<Uuid, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, password_hash, name, profile_image_url, phone_number,
                is_active, user_type, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.profile_image_url)
        .bind(&user.phone_number)
        .bind(user.is_active)
        .bind(user.user_type().to_string())
        .bind(user.created_at)
        .execute(&mut *tx)
        .await?;

        if let Some(profile) = user.provider() {
            upsert_profile(&mut tx, user.id, profile).await?;
        }

        tx.commit().await?;
        Ok(user.id)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE u.id = $1", SELECT_USER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE u.email = $1", SELECT_USER))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        write_user(&mut tx, user).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn modify(&self, id: Uuid, edit: UserEdit) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        // the profile side of the join is nullable, so only the users row is locked
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "{} WHERE u.id = $1 FOR UPDATE OF u",
            SELECT_USER
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        let mut user = match row {
            Some(row) => User::try_from(row)?,
            None => return Err(AppError::NotFound(format!("User not found: {}", id))),
        };

        // dropping the transaction rolls back and releases the lock
        edit(&mut user)?;

        write_user(&mut tx, &user).await?;
        tx.commit().await.map_err(StoreError::from)?;
        Ok(user)
    }
}
