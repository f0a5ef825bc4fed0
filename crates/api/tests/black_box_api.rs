use reqwest::StatusCode;
use serde_json::{Value, json};

use eshop_api::config::AppConfig;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over in-memory stores, bound to an ephemeral port.
        let app = eshop_api::app::build_app(&AppConfig::default())
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(&body).send().await.unwrap()
    }

    async fn put(&self, path: &str, body: Value) -> reqwest::Response {
        self.client.put(self.url(path)).json(&body).send().await.unwrap()
    }

    async fn patch(&self, path: &str, body: Value) -> reqwest::Response {
        self.client.patch(self.url(path)).json(&body).send().await.unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    async fn delete(&self, path: &str) -> reqwest::Response {
        self.client.delete(self.url(path)).send().await.unwrap()
    }

    /// Brand + type to hang items off. Returns their ids.
    async fn seed_references(&self) -> (i64, i64) {
        let res = self.post("/api/catalog-brands", json!({ "brand": ".NET" })).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let brand: Value = res.json().await.unwrap();

        let res = self.post("/api/catalog-types", json!({ "type": "T-Shirt" })).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let catalog_type: Value = res.json().await.unwrap();

        (
            brand["id"].as_i64().unwrap(),
            catalog_type["id"].as_i64().unwrap(),
        )
    }

    async fn create_item(&self, body: Value) -> Value {
        let res = self.post("/api/catalog-items", body).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        res.json().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn item_body(name: &str, brand: i64, catalog_type: i64, stock: i32, restock: i32, max: i32) -> Value {
    json!({
        "name": name,
        "description": format!("{name} description"),
        "price": 19.5,
        "pictureFileName": "1.png",
        "availableStock": stock,
        "restockThreshold": restock,
        "maxStockThreshold": max,
        "catalogBrand": { "id": brand },
        "catalogType": { "id": catalog_type }
    })
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.get("/health").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn brand_lifecycle() {
    let srv = TestServer::spawn().await;

    let res = srv.post("/api/catalog-brands", json!({ "brand": "Azure" })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(location, format!("/api/catalog-brands/{id}"));

    let res = srv
        .post("/api/catalog-brands", json!({ "id": 5, "brand": "Dup" }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "id_conflict");

    let res = srv
        .patch(&format!("/api/catalog-brands/{id}"), json!({ "id": id }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let same: Value = res.json().await.unwrap();
    assert_eq!(same["brand"], "Azure");

    let res = srv
        .put(
            &format!("/api/catalog-brands/{id}"),
            json!({ "id": id, "brand": "Contoso" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.get(&format!("/api/catalog-brands/{id}")).await;
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched["brand"], "Contoso");

    let res = srv.get("/api/catalog-brands").await;
    assert_eq!(res.headers()["x-total-count"], "1");

    let res = srv.delete(&format!("/api/catalog-brands/{id}")).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = srv.get(&format!("/api/catalog-brands/{id}")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn type_uses_type_key_and_requires_label() {
    let srv = TestServer::spawn().await;

    let res = srv.post("/api/catalog-types", json!({ "type": "Mug" })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["type"], "Mug");

    let res = srv.post("/api/catalog-types", json!({})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "validation_error");
}

#[tokio::test]
async fn item_crud_roundtrip() {
    let srv = TestServer::spawn().await;
    let (brand, catalog_type) = srv.seed_references().await;

    let res = srv
        .post(
            "/api/catalog-items",
            item_body("Hoodie", brand, catalog_type, 10, 2, 20),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    assert_eq!(location, format!("/api/catalog-items/{id}"));
    assert_eq!(created["catalogBrand"]["brand"], ".NET");
    assert_eq!(created["catalogType"]["type"], "T-Shirt");
    assert_eq!(created["onReorder"], false);
    assert_eq!(created["version"], 1);

    let res = srv.get(&format!("/api/catalog-items/{id}")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .patch(
            &format!("/api/catalog-items/{id}"),
            json!({ "id": id, "price": 25.99 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let patched: Value = res.json().await.unwrap();
    assert_eq!(patched["price"], 25.99);
    assert_eq!(patched["name"], "Hoodie");
    assert_eq!(patched["version"], 2);

    let mut full = item_body("Hoodie v2", brand, catalog_type, 5, 2, 20);
    full["id"] = json!(id);
    full["version"] = json!(1);
    let res = srv.put(&format!("/api/catalog-items/{id}"), full.clone()).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    full["version"] = json!(2);
    let res = srv.put(&format!("/api/catalog-items/{id}"), full).await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["name"], "Hoodie v2");

    let res = srv.delete(&format!("/api/catalog-items/{id}")).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = srv.get(&format!("/api/catalog-items/{id}")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = srv.delete(&format!("/api/catalog-items/{id}")).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn update_identity_rules() {
    let srv = TestServer::spawn().await;
    let (brand, catalog_type) = srv.seed_references().await;
    let created = srv
        .create_item(item_body("Mug", brand, catalog_type, 10, 2, 20))
        .await;
    let id = created["id"].as_i64().unwrap();

    let mut body = item_body("Mug", brand, catalog_type, 10, 2, 20);
    let res = srv.put(&format!("/api/catalog-items/{id}"), body.clone()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    body["id"] = json!(id + 1);
    let res = srv.put(&format!("/api/catalog-items/{id}"), body.clone()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    body["id"] = json!(999);
    let res = srv.put("/api/catalog-items/999", body).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv.get("/api/catalog-items/not-a-number").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_items_are_rejected() {
    let srv = TestServer::spawn().await;
    let (brand, catalog_type) = srv.seed_references().await;

    let mut body = item_body("Cap", brand, catalog_type, 10, 2, 20);
    body["price"] = json!(-1);
    let res = srv.post("/api/catalog-items", body).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .post(
            "/api/catalog-items",
            item_body("Cap", brand, catalog_type, 30, 2, 20),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(
        err["message"],
        "available stock must not exceed max stock threshold"
    );

    let res = srv
        .post("/api/catalog-items", item_body("Cap", 404, catalog_type, 1, 1, 2))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["message"], "brand must already exist");

    let res = srv.post("/api/catalog-items", json!({ "name": "Cap" })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(
        err["message"],
        "name, price, availableStock, restockThreshold, maxStockThreshold, catalogBrand and catalogType cannot be null"
    );

    let res = srv.get("/api/catalog-items").await;
    assert_eq!(res.headers()["x-total-count"], "0");
}

#[tokio::test]
async fn prices_are_decimal_amounts() {
    let srv = TestServer::spawn().await;
    let (brand, catalog_type) = srv.seed_references().await;

    let mut body = item_body("Cap", brand, catalog_type, 10, 2, 20);
    body["price"] = json!(19.99);
    let created = srv.create_item(body).await;
    assert_eq!(created["price"], 19.99);

    let res = srv.get(&format!("/api/catalog-items/{}", created["id"])).await;
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched["price"], 19.99);

    let mut body = item_body("Cap", brand, catalog_type, 10, 2, 20);
    body["price"] = json!(19.999);
    let res = srv.post("/api/catalog-items", body).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "validation_error");
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/api/catalog-items"))
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_body");

    let res = srv
        .post("/api/catalog-items", json!({ "name": "Cap", "availableStock": "lots" }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_body");

    let res = srv.post("/api/catalog-brands", json!("Azure")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_body");
}

#[tokio::test]
async fn listing_filters_and_pages() {
    let srv = TestServer::spawn().await;
    let (brand, catalog_type) = srv.seed_references().await;

    let res = srv.post("/api/catalog-brands", json!({ "brand": "Azure" })).await;
    let azure: Value = res.json().await.unwrap();
    let azure = azure["id"].as_i64().unwrap();

    let hoodie = srv
        .create_item(item_body("Black Hoodie", brand, catalog_type, 10, 2, 20))
        .await;
    srv.create_item(item_body("White Mug", azure, catalog_type, 10, 2, 20))
        .await;
    srv.create_item(item_body("Blue Hoodie", azure, catalog_type, 10, 2, 20))
        .await;

    let res = srv.get("/api/catalog-items?brand=Azure").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-total-count"], "2");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let res = srv.get("/api/catalog-items?term=Hoodie&size=1").await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["size"], 1);
    assert_eq!(body["hasMore"], true);
    assert_eq!(body["items"][0]["name"], "Black Hoodie");

    let res = srv
        .get(&format!("/api/catalog-items?ids={}", hoodie["id"]))
        .await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["total"], 1);

    let res = srv.get("/api/catalog-items?ids=1,nope").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stock_endpoints_adjust_and_report_applied_units() {
    let srv = TestServer::spawn().await;
    let (brand, catalog_type) = srv.seed_references().await;
    let created = srv
        .create_item(item_body("Mug", brand, catalog_type, 20, 5, 30))
        .await;
    let id = created["id"].as_i64().unwrap();

    let res = srv
        .patch("/api/catalog-items/add/15", json!({ "id": id }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-stock-applied"], "10");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["availableStock"], 30);

    let res = srv
        .patch("/api/catalog-items/remove/40", json!({ "id": id }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-stock-applied"], "30");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["availableStock"], 0);

    let res = srv
        .patch("/api/catalog-items/remove/1", json!({ "id": id }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "out_of_stock");

    let res = srv
        .patch("/api/catalog-items/add/1", json!({}))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn zero_quantity_leaves_item_untouched() {
    let srv = TestServer::spawn().await;
    let (brand, catalog_type) = srv.seed_references().await;
    let created = srv
        .create_item(item_body("Mug", brand, catalog_type, 20, 5, 30))
        .await;
    let id = created["id"].as_i64().unwrap();

    let res = srv
        .patch("/api/catalog-items/remove/0", json!({ "id": id }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "invalid_quantity");

    let res = srv.get(&format!("/api/catalog-items/{id}")).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["availableStock"], 20);
    assert_eq!(body["version"], 1);
}

#[tokio::test]
async fn referenced_brand_cannot_be_deleted() {
    let srv = TestServer::spawn().await;
    let (brand, catalog_type) = srv.seed_references().await;
    srv.create_item(item_body("Mug", brand, catalog_type, 1, 1, 2))
        .await;

    let res = srv.delete(&format!("/api/catalog-brands/{brand}")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv.get(&format!("/api/catalog-brands/{brand}")).await;
    assert_eq!(res.status(), StatusCode::OK);
}
