use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::test_support::FakeRemoteService;

fn auction_call_record() -> serde_json::Value {
    json!({
        "_id": "ac-1",
        "orderId": "o-1",
        "companyId": "c-1",
        "price": 150,
        "vehicleId": "v-1",
        "driverId": "d-1",
        "createdAt": 1_737_000_000_000i64,
        "updatedAt": 1_737_000_000_000i64,
    })
}

#[test]
fn price_starts_at_the_midpoint() {
    let form = BidForm::new(100, 200);
    assert_eq!(form.price(), 150);
}

#[test]
fn price_is_clamped_to_the_auction_bounds() {
    let mut form = BidForm::new(100, 200);
    form.set_price(40);
    assert_eq!(form.price(), 100);
    form.set_price(900);
    assert_eq!(form.price(), 200);
    form.set_price(175);
    assert_eq!(form.price(), 175);
}

#[test]
fn inverted_bounds_collapse_to_the_minimum() {
    let form = BidForm::new(300, 100);
    assert_eq!(form.price(), 300);
}

#[tokio::test]
async fn bid_requires_vehicle_and_driver() {
    let service = Arc::new(FakeRemoteService::new());
    let screen = OrderBidScreen::new(
        Arc::clone(&service) as Arc<dyn RemoteService>,
        "o-1".into(),
    );

    let form = BidForm::new(100, 200);
    let err = screen.submit_bid(&form).await.expect_err("no assignment");
    let ScreenError::Validation(errors) = err else {
        panic!("expected validation failure");
    };
    assert!(errors.get("vehicle").is_some());
    assert!(errors.get("driver").is_some());
    assert!(service.create_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn bid_posts_the_assignment_and_price() {
    let service = Arc::new(FakeRemoteService::new());
    service.push_create(auction_call_record());
    let screen = OrderBidScreen::new(
        Arc::clone(&service) as Arc<dyn RemoteService>,
        "o-1".into(),
    );

    let mut form = BidForm::new(100, 200);
    form.select_vehicle("v-1".into());
    form.select_driver("d-1".into());
    form.set_price(150);

    let call = screen.submit_bid(&form).await.expect("bid");
    assert_eq!(call.id.as_str(), "ac-1");

    let creates = service.create_calls.lock().unwrap();
    let (collection, payload) = &creates[0];
    assert_eq!(collection, "auction-calls");
    assert_eq!(
        payload,
        &json!({ "orderId": "o-1", "price": 150, "vehicleId": "v-1", "driverId": "d-1" })
    );
}
