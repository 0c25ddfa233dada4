use std::sync::Arc;

use serde_json::json;

use shared::{
    domain::{AuctionCall, DriverId, OrderId, VehicleId},
    error::{ApiError, ErrorCode},
};

use crate::{
    error::RemoteError,
    screens::ScreenError,
    transport::RemoteService,
    validate::ValidationErrors,
};

/// Bid-placement state for one order auction: a price slider bounded by the
/// auction's range plus a vehicle/driver assignment. The bid cannot be sent
/// until both are selected.
#[derive(Debug, Clone)]
pub struct BidForm {
    min_price: u32,
    max_price: u32,
    price: u32,
    pub vehicle: Option<VehicleId>,
    pub driver: Option<DriverId>,
}

impl BidForm {
    pub fn new(min_price: u32, max_price: u32) -> Self {
        let max_price = max_price.max(min_price);
        Self {
            min_price,
            max_price,
            price: min_price + (max_price - min_price) / 2,
            vehicle: None,
            driver: None,
        }
    }

    pub fn price(&self) -> u32 {
        self.price
    }

    /// Slider semantics: any requested price lands inside the bounds.
    pub fn set_price(&mut self, price: u32) {
        self.price = price.clamp(self.min_price, self.max_price);
    }

    pub fn select_vehicle(&mut self, vehicle: VehicleId) {
        self.vehicle = Some(vehicle);
    }

    pub fn select_driver(&mut self, driver: DriverId) {
        self.driver = Some(driver);
    }

    fn assignment(&self) -> Result<(&VehicleId, &DriverId), ValidationErrors> {
        match (&self.vehicle, &self.driver) {
            (Some(vehicle), Some(driver)) => Ok((vehicle, driver)),
            (vehicle, driver) => {
                let mut errors = ValidationErrors::new();
                if vehicle.is_none() {
                    errors.add("vehicle", "select a vehicle to complete the bid");
                }
                if driver.is_none() {
                    errors.add("driver", "select a driver to complete the bid");
                }
                Err(errors)
            }
        }
    }
}

pub struct OrderBidScreen {
    service: Arc<dyn RemoteService>,
    order_id: OrderId,
}

impl OrderBidScreen {
    pub fn new(service: Arc<dyn RemoteService>, order_id: OrderId) -> Self {
        Self { service, order_id }
    }

    pub async fn submit_bid(&self, form: &BidForm) -> Result<AuctionCall, ScreenError> {
        let (vehicle, driver) = form.assignment()?;

        let created = self
            .service
            .create(
                "auction-calls",
                json!({
                    "orderId": self.order_id,
                    "price": form.price(),
                    "vehicleId": vehicle,
                    "driverId": driver,
                }),
            )
            .await?;

        serde_json::from_value(created).map_err(|err| {
            ScreenError::Remote(RemoteError::Server(ApiError::new(
                ErrorCode::Internal,
                format!("malformed auction call record: {err}"),
            )))
        })
    }
}

#[cfg(test)]
#[path = "../tests/order_bid_tests.rs"]
mod tests;
