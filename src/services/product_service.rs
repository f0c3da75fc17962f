use sea_orm::{EntityTrait, QueryOrder};

use crate::{
    dto::products::{ProductList, StockMap},
    entity::products::{Column, Entity as Products, Model as ProductModel},
    error::AppResult,
    models::Product,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_products(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let items: Vec<Product> = Products::find()
        .order_by_asc(Column::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Ok",
        ProductList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn current_stocks(state: &AppState) -> AppResult<ApiResponse<StockMap>> {
    let stocks = Products::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p.stock))
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        StockMap { stocks },
        Some(Meta::empty()),
    ))
}

pub fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        price: model.price,
        available_stock: model.stock,
        image: model.image,
        description: model.description,
    }
}
