use sqlx::{PgConnection, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::db::store::order_cities;
use crate::errors::AppError;
use crate::models::city::{City, CityRow};
use crate::models::country::{Country, CountryRow};

pub async fn fetch_country(
    conn: &mut PgConnection,
    country_id: i32,
) -> Result<Option<Arc<Country>>, AppError> {
    let row = sqlx::query_as::<_, CountryRow>(
        "SELECT id, status, country_name, country_code FROM countries WHERE id = $1",
    )
    .bind(country_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|row| Arc::new(Country::from(row))))
}

pub async fn fetch_countries(
    conn: &mut PgConnection,
    country_ids: &[i32],
) -> Result<Vec<Country>, AppError> {
    if country_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, CountryRow>(
        "SELECT id, status, country_name, country_code FROM countries WHERE id = ANY($1)",
    )
    .bind(country_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(Country::from).collect())
}

pub async fn list_countries(conn: &mut PgConnection) -> Result<Vec<Country>, AppError> {
    let rows = sqlx::query_as::<_, CountryRow>(
        "SELECT id, status, country_name, country_code FROM countries ORDER BY country_name",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(Country::from).collect())
}

pub async fn list_cities(
    conn: &mut PgConnection,
    country_id: Option<i32>,
) -> Result<Vec<City>, AppError> {
    let mut query: QueryBuilder<'_, Postgres> =
        QueryBuilder::new("SELECT id, status, city_name, country_id FROM cities");
    if let Some(country_id) = country_id {
        query.push(" WHERE country_id = ");
        query.push_bind(country_id);
    }
    query.push(" ORDER BY city_name");

    let rows = query
        .build_query_as::<CityRow>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows.into_iter().map(City::from).collect())
}

/// Loads the given cities, returned in the order of `city_ids`.
///
/// Fails with `NotFound` naming the first id that has no row.
pub async fn fetch_cities_in_order(
    conn: &mut PgConnection,
    city_ids: &[i32],
) -> Result<Vec<City>, AppError> {
    if city_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, CityRow>(
        "SELECT id, status, city_name, country_id FROM cities WHERE id = ANY($1)",
    )
    .bind(city_ids)
    .fetch_all(&mut *conn)
    .await?;

    order_cities(rows.into_iter().map(City::from).collect(), city_ids)
}
