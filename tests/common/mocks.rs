//! Canned payloads in the services' wire shapes.

use serde_json::{json, Value};

/// Directory reply for `estados`.
pub fn regions(codes: &[&str]) -> Value {
    Value::Array(
        codes
            .iter()
            .map(|code| json!({"id": 0, "sigla": code, "nome": code}))
            .collect(),
    )
}

/// Directory reply for `estados/{uf}/municipios`.
pub fn localities(names: &[&str]) -> Value {
    Value::Array(
        names
            .iter()
            .map(|name| json!({"id": 0, "nome": name}))
            .collect(),
    )
}

/// Registry reply for `items`.
pub fn items(entries: &[(u64, &str)]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|(id, title)| {
                json!({
                    "id": id,
                    "title": title,
                    "image_url": format!("https://registry.example/uploads/{id}.svg"),
                })
            })
            .collect(),
    )
}

/// Registry reply for `points`, `(id, name, latitude, longitude)` each.
pub fn points(entries: &[(u64, &str, f64, f64)]) -> Value {
    Value::Array(
        entries
            .iter()
            .map(|(id, name, latitude, longitude)| {
                json!({
                    "id": id,
                    "name": name,
                    "image": format!("{id}.jpg"),
                    "image_url": format!("https://registry.example/uploads/{id}.jpg"),
                    "latitude": latitude,
                    "longitude": longitude,
                })
            })
            .collect(),
    )
}

/// Registry reply for `location`.
pub fn location(city: &str, latitude: f64, longitude: f64) -> Value {
    json!([{"city": city, "location": [latitude, longitude]}])
}

/// Registry reply for `points/{id}`.
pub fn detail(name: &str, city: &str, uf: &str, item_titles: &[&str]) -> Value {
    json!({
        "serializedPoint": {
            "image": "store.jpg",
            "image_url": "https://registry.example/uploads/store.jpg",
            "name": name,
            "email": "contact@example.com",
            "whatsapp": "5511999999999",
            "city": city,
            "uf": uf,
        },
        "items": item_titles
            .iter()
            .map(|title| json!({"title": title}))
            .collect::<Vec<_>>(),
    })
}
