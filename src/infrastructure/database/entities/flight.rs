// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "flights")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub import_batch_id: Uuid,
    pub date: Date,
    pub arrival_date: Option<Date>,
    pub flight_number: Option<String>,
    pub departure_airport_iata: Option<String>,
    pub departure_airport_icao: Option<String>,
    pub arrival_airport_iata: Option<String>,
    pub arrival_airport_icao: Option<String>,
    pub airline: Option<String>,
    pub aircraft: Option<String>,
    pub registration: Option<String>,
    pub created_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
