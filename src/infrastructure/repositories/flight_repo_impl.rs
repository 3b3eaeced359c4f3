// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::flight::Flight;
use crate::domain::repositories::flight_repository::FlightRepository;
use crate::domain::repositories::scrape_job_repository::RepositoryError;
use crate::infrastructure::database::entities::flight as flight_entity;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

/// 航班仓库实现
#[derive(Clone)]
pub struct FlightRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl FlightRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<flight_entity::Model> for Flight {
    fn from(model: flight_entity::Model) -> Self {
        Self {
            id: model.id,
            import_batch_id: model.import_batch_id,
            date: model.date,
            arrival_date: model.arrival_date,
            flight_number: model.flight_number,
            departure_airport_iata: model.departure_airport_iata,
            departure_airport_icao: model.departure_airport_icao,
            arrival_airport_iata: model.arrival_airport_iata,
            arrival_airport_icao: model.arrival_airport_icao,
            airline: model.airline,
            aircraft: model.aircraft,
            registration: model.registration,
        }
    }
}

impl From<&Flight> for flight_entity::ActiveModel {
    fn from(flight: &Flight) -> Self {
        Self {
            id: Set(flight.id),
            import_batch_id: Set(flight.import_batch_id),
            date: Set(flight.date),
            arrival_date: Set(flight.arrival_date),
            flight_number: Set(flight.flight_number.clone()),
            departure_airport_iata: Set(flight.departure_airport_iata.clone()),
            departure_airport_icao: Set(flight.departure_airport_icao.clone()),
            arrival_airport_iata: Set(flight.arrival_airport_iata.clone()),
            arrival_airport_icao: Set(flight.arrival_airport_icao.clone()),
            airline: Set(flight.airline.clone()),
            aircraft: Set(flight.aircraft.clone()),
            registration: Set(flight.registration.clone()),
            created_at: Set(Utc::now().into()),
        }
    }
}

/// 任一代码相同即视为同一机场
fn airport_condition(
    iata: &Option<String>,
    icao: &Option<String>,
    iata_column: flight_entity::Column,
    icao_column: flight_entity::Column,
) -> Option<Condition> {
    let mut condition = Condition::any();
    let mut present = false;
    if let Some(code) = iata {
        condition = condition.add(iata_column.eq(code.clone()));
        present = true;
    }
    if let Some(code) = icao {
        condition = condition.add(icao_column.eq(code.clone()));
        present = true;
    }
    present.then_some(condition)
}

#[async_trait]
impl FlightRepository for FlightRepositoryImpl {
    async fn create(&self, flight: &Flight) -> Result<(), RepositoryError> {
        let model: flight_entity::ActiveModel = flight.into();
        model.insert(self.db.as_ref()).await?;
        Ok(())
    }

    async fn find_by_registration(
        &self,
        registration: &str,
    ) -> Result<Vec<Flight>, RepositoryError> {
        let models = flight_entity::Entity::find()
            .filter(flight_entity::Column::Registration.eq(registration))
            .order_by_asc(flight_entity::Column::Date)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Flight::from).collect())
    }

    async fn exists_duplicate(&self, flight: &Flight) -> Result<bool, RepositoryError> {
        let mut condition = Condition::all().add(flight_entity::Column::Date.eq(flight.date));

        if let Some(departure) = airport_condition(
            &flight.departure_airport_iata,
            &flight.departure_airport_icao,
            flight_entity::Column::DepartureAirportIata,
            flight_entity::Column::DepartureAirportIcao,
        ) {
            condition = condition.add(departure);
        }
        if let Some(arrival) = airport_condition(
            &flight.arrival_airport_iata,
            &flight.arrival_airport_icao,
            flight_entity::Column::ArrivalAirportIata,
            flight_entity::Column::ArrivalAirportIcao,
        ) {
            condition = condition.add(arrival);
        }
        if let Some(number) = &flight.flight_number {
            condition = condition.add(flight_entity::Column::FlightNumber.eq(number.clone()));
        }
        if let Some(registration) = &flight.registration {
            condition = condition.add(flight_entity::Column::Registration.eq(registration.clone()));
        }

        let count = flight_entity::Entity::find()
            .filter(condition)
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = flight_entity::Entity::delete_many()
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }
}
