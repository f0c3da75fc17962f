use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressList, CreateAddressRequest},
        auth::{
            ChallengeResponse, CompleteSignupRequest, ContactRequest, LoginResponse,
            VerifyOtpRequest,
        },
        careers::{
            ApplicationList, ApplicationUpload, JobList, OfficeList, SubmitApplicationResponse,
            WithdrawApplicationRequest,
        },
        cart::{CartView, ReplaceCartRequest},
        orders::{OrderList, PlaceOrderRequest, PlaceOrderResponse},
        outbox::{OutboxList, OutboxStatus},
        products::{
            DispatchRequest, DispatchSummary, ProductList, RestockRequest, RestockResponse,
            StockMap, StockNotificationRequest,
        },
        returns::{AddressInfo, ContactInfo, ReturnRequestResponse, ReturnUpload},
    },
    models::{
        AddressSnapshot, CartLine, Job, JobApplication, Office, Order, OrderLineItem,
        OrderStatus, OutboxEvent, Product, ReturnDetails, ShippingAddress, UserProfile,
    },
    response::{ApiResponse, Meta},
    routes::{addresses, admin, auth, careers, cart, health, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::request_signup_otp,
        auth::verify_signup_otp,
        auth::complete_signup,
        auth::request_login_otp,
        auth::verify_login_otp,
        products::list_products,
        products::product_stocks,
        products::request_stock_notification,
        cart::get_cart,
        cart::replace_cart,
        addresses::list_addresses,
        addresses::create_address,
        orders::list_orders,
        orders::get_order,
        orders::place_order,
        orders::request_return,
        orders::download_invoice,
        orders::download_return_invoice,
        careers::list_jobs,
        careers::list_locations,
        careers::submit_application,
        careers::my_applications,
        careers::withdraw_application,
        admin::restock_product,
        admin::dispatch_notifications,
        admin::list_outbox,
        admin::retry_outbox_event
    ),
    components(
        schemas(
            UserProfile,
            Product,
            CartLine,
            OrderStatus,
            AddressSnapshot,
            ShippingAddress,
            OrderLineItem,
            ReturnDetails,
            Order,
            Job,
            Office,
            JobApplication,
            OutboxEvent,
            ContactRequest,
            ChallengeResponse,
            VerifyOtpRequest,
            CompleteSignupRequest,
            LoginResponse,
            ProductList,
            StockMap,
            StockNotificationRequest,
            RestockRequest,
            RestockResponse,
            DispatchRequest,
            DispatchSummary,
            CartView,
            ReplaceCartRequest,
            AddressList,
            CreateAddressRequest,
            PlaceOrderRequest,
            PlaceOrderResponse,
            OrderList,
            AddressInfo,
            ContactInfo,
            ReturnUpload,
            ReturnRequestResponse,
            JobList,
            OfficeList,
            ApplicationList,
            ApplicationUpload,
            SubmitApplicationResponse,
            WithdrawApplicationRequest,
            OutboxList,
            OutboxStatus,
            params::Pagination,
            params::SortOrder,
            Meta,
            ApiResponse<OrderList>,
            ApiResponse<PlaceOrderResponse>,
            ApiResponse<ProductList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "OTP signup and login"),
        (name = "Products", description = "Catalog, stock levels and back-in-stock waitlist"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Addresses", description = "Shipping address book"),
        (name = "Orders", description = "Checkout, order history and invoices"),
        (name = "Returns", description = "Return requests and return invoices"),
        (name = "Careers", description = "Job listings and applications"),
        (name = "Admin", description = "Restock, notification dispatch and outbox"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
