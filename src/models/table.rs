use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::EnumIter;
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize, strum::Display,
)]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
    Cleaning,
    OutOfService,
}

/// Dining table aggregate. `reserved_at` is set exactly while the table is
/// `Reserved`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableRecord")]
pub struct Table {
    pub id: Uuid,
    pub number: i32,
    pub capacity: i32,
    status: TableStatus,
    reserved_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Deserialize)]
struct TableRecord {
    id: Uuid,
    number: i32,
    capacity: i32,
    status: TableStatus,
    reserved_at: Option<DateTime<Utc>>,
    version: i32,
}

impl TryFrom<TableRecord> for Table {
    type Error = DomainError;

    fn try_from(record: TableRecord) -> DomainResult<Self> {
        let mut table = Table::new(record.number, record.capacity)?;
        match (record.status, record.reserved_at) {
            (TableStatus::Reserved, None) => {
                return Err(DomainError::new(format!(
                    "Reserved table {} has no reservation time",
                    record.number
                )))
            }
            (TableStatus::Reserved, Some(_)) | (_, None) => {}
            (status, Some(_)) => {
                return Err(DomainError::new(format!(
                    "Table {} has a reservation time but is {}",
                    record.number, status
                )))
            }
        }
        table.id = record.id;
        table.status = record.status;
        table.reserved_at = record.reserved_at;
        table.version = record.version;
        Ok(table)
    }
}

impl Table {
    pub fn new(number: i32, capacity: i32) -> DomainResult<Self> {
        let mut errors = Vec::new();
        if number <= 0 {
            errors.push("Table number must be positive".to_string());
        }
        if capacity <= 0 {
            errors.push("Table capacity must be positive".to_string());
        }
        if !errors.is_empty() {
            return Err(DomainError::from_messages(errors));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            number,
            capacity,
            status: TableStatus::Available,
            reserved_at: None,
            version: 1,
        })
    }

    pub fn status(&self) -> TableStatus {
        self.status
    }

    pub fn reserved_at(&self) -> Option<DateTime<Utc>> {
        self.reserved_at
    }

    pub fn is_available(&self) -> bool {
        self.status == TableStatus::Available
    }

    pub fn reserve(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != TableStatus::Available {
            return Err(DomainError::new(format!(
                "Cannot reserve table {}. Current status: {}",
                self.number, self.status
            )));
        }
        self.status = TableStatus::Reserved;
        self.reserved_at = Some(at);
        Ok(())
    }

    pub fn occupy(&mut self) -> DomainResult<()> {
        if !matches!(self.status, TableStatus::Available | TableStatus::Reserved) {
            return Err(DomainError::new(format!(
                "Cannot occupy table {}. Current status: {}",
                self.number, self.status
            )));
        }
        self.status = TableStatus::Occupied;
        self.reserved_at = None;
        Ok(())
    }

    pub fn make_available(&mut self) {
        self.status = TableStatus::Available;
        self.reserved_at = None;
    }

    pub fn take_out_of_service(&mut self) -> DomainResult<()> {
        if self.status == TableStatus::Occupied {
            return Err(DomainError::new(format!(
                "Cannot take occupied table {} out of service",
                self.number
            )));
        }
        self.status = TableStatus::OutOfService;
        self.reserved_at = None;
        Ok(())
    }

    /// Unconditional status setter. `Reserved` stamps `now`; every other
    /// status clears the reservation stamp.
    pub fn set_status(&mut self, status: TableStatus, now: DateTime<Utc>) {
        self.status = status;
        self.reserved_at = match status {
            TableStatus::Reserved => Some(now),
            _ => None,
        };
    }
}
