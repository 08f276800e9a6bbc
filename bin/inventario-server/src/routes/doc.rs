use crate::routes::{auth, chat, health, inventory, proxy, report};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "inventario-server",
    description = "Inventory dashboard backend: proxy, inventory views, assistant and reports",
    version = "0.1.0"
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(proxy::ProxyApi::openapi());
    root.merge(auth::AuthApi::openapi());
    root.merge(inventory::InventoryApi::openapi());
    root.merge(chat::ChatApi::openapi());
    root.merge(report::ReportApi::openapi());
    root
}
