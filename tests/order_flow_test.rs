mod common;

use axum::http::{header, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;
use waybill_api::entities::{order, order_item};

use common::{body_json, sample_order_pairs, spawn_app};

fn as_decimal(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .expect("decimal fields serialize as strings")
        .parse()
        .unwrap()
}

#[tokio::test]
async fn create_then_fetch_round_trips_the_submission() {
    let app = spawn_app().await;

    let response = app
        .post_form("/orders/create", &sample_order_pairs("SF001"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let payload = body_json(response).await;
    assert_eq!(payload["status"], "success");
    assert_eq!(payload["message"], "Order created successfully");
    let order_id = payload["orderId"].as_str().unwrap().to_string();

    let detail = body_json(app.get(&format!("/orders/{order_id}")).await).await;
    assert_eq!(detail["order_number"], "SF001");
    assert_eq!(detail["sender"], "Alice");
    assert_eq!(detail["receiver"], "Bob");
    assert_eq!(detail["date"], "2026-08-29");
    assert_eq!(as_decimal(&detail["total_freight"]), dec!(65.5));

    let items = detail["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["item_name"], "Box");
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(as_decimal(&items[0]["freight"]), dec!(10.0));
    assert_eq!(as_decimal(&items[0]["insurance_fee"]), Decimal::ZERO);
    assert_eq!(items[1]["item_name"], "Crate");
    assert_eq!(as_decimal(&items[1]["weight"]), dec!(20));
    assert_eq!(as_decimal(&items[1]["insurance_fee"]), dec!(3.25));
}

#[tokio::test]
async fn missing_required_field_rejects_and_persists_nothing() {
    let app = spawn_app().await;

    let mut form = sample_order_pairs("SF002");
    form.retain(|(key, _)| key != "senderPhone");

    let response = app.post_form("/orders/create", &form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let payload = body_json(response).await;
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["message"], "Missing required field: sender_phone");

    let orders = order::Entity::find().count(&*app.db).await.unwrap();
    assert_eq!(orders, 0);
}

#[tokio::test]
async fn invalid_item_number_rejects_the_whole_submission() {
    let app = spawn_app().await;

    let mut form = sample_order_pairs("SF003");
    for entry in form.iter_mut() {
        if entry.0 == "items[0][quantity]" {
            entry.1 = "two".to_string();
        }
    }

    let response = app.post_form("/orders/create", &form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let payload = body_json(response).await;
    assert_eq!(
        payload["message"],
        "Invalid numeric value for items[0][quantity]"
    );

    // The header must not survive a bad item.
    assert_eq!(order::Entity::find().count(&*app.db).await.unwrap(), 0);
    assert_eq!(order_item::Entity::find().count(&*app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn non_contiguous_item_indices_are_rejected() {
    let app = spawn_app().await;

    let mut form = sample_order_pairs("SF004");
    for entry in form.iter_mut() {
        entry.0 = entry.0.replace("items[1]", "items[3]");
    }

    let response = app.post_form("/orders/create", &form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let payload = body_json(response).await;
    assert!(payload["message"]
        .as_str()
        .unwrap()
        .contains("contiguous"));
}

#[tokio::test]
async fn duplicate_order_number_is_rejected() {
    let app = spawn_app().await;

    let first = app
        .post_form("/orders/create", &sample_order_pairs("SF005"))
        .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .post_form("/orders/create", &sample_order_pairs("SF005"))
        .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);

    let payload = body_json(second).await;
    assert_eq!(payload["message"], "Order number SF005 already exists");
}

#[tokio::test]
async fn unknown_order_returns_not_found() {
    let app = spawn_app().await;

    let response = app.get(&format!("/orders/{}", Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let payload = body_json(response).await;
    assert_eq!(payload["error"], "Order not found");
}

#[tokio::test]
async fn history_requires_a_session() {
    let app = spawn_app().await;

    let response = app.get("/orders/history").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn history_paginates_and_clamps_the_page_parameter() {
    let app = spawn_app().await;
    let cookie = app.register_session("dispatcher").await;

    for n in 0..12 {
        let response = app
            .post_form("/orders/create", &sample_order_pairs(&format!("PG{n:03}")))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let page1 = body_json(app.get_with_cookie("/orders/history", &cookie).await).await;
    assert_eq!(page1["page"], 1);
    assert_eq!(page1["total"], 12);
    assert_eq!(page1["total_pages"], 2);
    assert_eq!(page1["orders"].as_array().unwrap().len(), 10);
    assert_eq!(page1["orders"][0]["order_number"], "PG000");

    let page2 = body_json(
        app.get_with_cookie("/orders/history?page=2", &cookie)
            .await,
    )
    .await;
    assert_eq!(page2["page"], 2);
    assert_eq!(page2["orders"].as_array().unwrap().len(), 2);

    // Out-of-range and garbage page values clamp instead of erroring.
    let clamped_high = body_json(
        app.get_with_cookie("/orders/history?page=9999", &cookie)
            .await,
    )
    .await;
    assert_eq!(clamped_high["page"], 2);

    let clamped_low = body_json(
        app.get_with_cookie("/orders/history?page=0", &cookie)
            .await,
    )
    .await;
    assert_eq!(clamped_low["page"], 1);

    let garbage = app
        .get_with_cookie("/orders/history?page=abc", &cookie)
        .await;
    assert_eq!(garbage.status(), StatusCode::OK);
    assert_eq!(body_json(garbage).await["page"], 1);
}

#[tokio::test]
async fn empty_history_is_page_one_of_one() {
    let app = spawn_app().await;
    let cookie = app.register_session("dispatcher").await;

    let payload = body_json(app.get_with_cookie("/orders/history", &cookie).await).await;
    assert_eq!(payload["total"], 0);
    assert_eq!(payload["page"], 1);
    assert_eq!(payload["total_pages"], 1);
    assert!(payload["orders"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn edit_replaces_the_header_and_item_set() {
    let app = spawn_app().await;

    let created = body_json(
        app.post_form("/orders/create", &sample_order_pairs("SF010"))
            .await,
    )
    .await;
    let order_id = created["orderId"].as_str().unwrap().to_string();

    // The edit form source returns the same payload as the detail fetch.
    let prefill = body_json(app.get(&format!("/orders/{order_id}/edit")).await).await;
    assert_eq!(prefill["order_number"], "SF010");
    assert_eq!(prefill["items"].as_array().unwrap().len(), 2);

    let mut form = sample_order_pairs("SF010");
    form.retain(|(key, _)| !key.starts_with("items[1]"));
    for entry in form.iter_mut() {
        match entry.0.as_str() {
            "receiverName" => entry.1 = "Carol".to_string(),
            "items[0][productName]" => entry.1 = "Barrel".to_string(),
            "items[0][freight]" => entry.1 = "42".to_string(),
            _ => {}
        }
    }

    let response = app
        .post_form(&format!("/orders/{order_id}/edit"), &form)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/orders/history");

    let detail = body_json(app.get(&format!("/orders/{order_id}")).await).await;
    assert_eq!(detail["receiver"], "Carol");
    let items = detail["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["item_name"], "Barrel");
    assert_eq!(as_decimal(&items[0]["freight"]), dec!(42));

    // Exactly one item row remains in storage.
    assert_eq!(order_item::Entity::find().count(&*app.db).await.unwrap(), 1);
}

#[tokio::test]
async fn edit_of_unknown_order_returns_not_found() {
    let app = spawn_app().await;

    let response = app
        .post_form(
            &format!("/orders/{}/edit", Uuid::new_v4()),
            &sample_order_pairs("SF011"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_cascades_and_repeat_delete_is_not_found() {
    let app = spawn_app().await;

    let created = body_json(
        app.post_form("/orders/create", &sample_order_pairs("SF012"))
            .await,
    )
    .await;
    let order_id = created["orderId"].as_str().unwrap().to_string();

    let response = app
        .post_form(&format!("/orders/{order_id}/delete"), &[])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "success");

    assert_eq!(order::Entity::find().count(&*app.db).await.unwrap(), 0);
    assert_eq!(order_item::Entity::find().count(&*app.db).await.unwrap(), 0);

    let repeat = app
        .post_form(&format!("/orders/{order_id}/delete"), &[])
        .await;
    assert_eq!(repeat.status(), StatusCode::NOT_FOUND);

    let detail = app.get(&format!("/orders/{order_id}")).await;
    assert_eq!(detail.status(), StatusCode::NOT_FOUND);
}
