use actix_web::{HttpResponse, Responder};

pub async fn handler() -> impl Responder {
    HttpResponse::Ok().body("✅ Super-Bot is running!")
}
