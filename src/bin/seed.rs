//! Load the sample catalog, careers data and an admin account. Existing rows
//! are left untouched, so the command can be re-run.

use anyhow::Context;
use nila_store_api::{
    db::{DbPool, create_pool, run_migrations},
    validation::user_key,
};

struct SeedProduct {
    id: &'static str,
    name: &'static str,
    price: i64,
    stock: i32,
    image: &'static str,
    description: &'static str,
}

const PRODUCTS: [SeedProduct; 8] = [
    SeedProduct {
        id: "item001",
        name: "Ethereal Silk Saree",
        price: 4999,
        stock: 10,
        image: "https://images.unsplash.com/photo-1620799140408-edc6d633?w=500&q=80",
        description: "Graceful sarees woven with pure silk threads.",
    },
    SeedProduct {
        id: "item002",
        name: "Urban Comfort Kurti",
        price: 1299,
        stock: 25,
        image: "https://images.unsplash.com/photo-1617137968427-85924c800a22?w=500&q=80",
        description: "Contemporary designs for the modern lifestyle.",
    },
    SeedProduct {
        id: "item003",
        name: "Festive Anarkali",
        price: 7500,
        stock: 8,
        image: "https://images.unsplash.com/photo-1583209575916-b6b6a4a6e8b4?w=500&q=80",
        description: "Celebrate in style with our vibrant festive collection.",
    },
    SeedProduct {
        id: "item004",
        name: "Dreamy Linen Bedsheet",
        price: 2500,
        stock: 15,
        image: "https://images.unsplash.com/photo-1593930432389-1a73c1c3b4a2?w=500&q=80",
        description: "Comfortable and chic home linen essentials.",
    },
    SeedProduct {
        id: "item005",
        name: "Classic Cotton Salwar",
        price: 1800,
        stock: 30,
        image: "https://images.unsplash.com/photo-1600871649646-a1851b453e0d?w=500&q=80",
        description: "Breathable and elegant everyday cotton wear.",
    },
    SeedProduct {
        id: "item006",
        name: "Bridal Lehenga",
        price: 25000,
        stock: 5,
        image: "https://images.unsplash.com/photo-1596609552197-0dc234123652?w=500&q=80",
        description: "Exquisite handcrafted bridal wear for your special day.",
    },
    SeedProduct {
        id: "item007",
        name: "Designer Georgette Gown",
        price: 8999,
        stock: 12,
        image: "https://images.unsplash.com/photo-1594650537308-391307047f9e?w=500&q=80",
        description: "Flowy and elegant for evening parties.",
    },
    SeedProduct {
        id: "item008",
        name: "Handloom Cotton Towels",
        price: 999,
        stock: 0,
        image: "https://images.unsplash.com/photo-1611099149791-33299a9a5f7e?w=500&q=80",
        description: "Set of 2 soft, absorbent handloom towels.",
    },
];

// (key, number, title, location, category, type, description)
const JOBS: [(&str, i32, &str, &str, &str, &str, &str); 8] = [
    (
        "job01",
        1,
        "Senior Software Engineer, Backend",
        "Chennai, TN",
        "Engineering",
        "Full-time",
        "Design and develop scalable backend services for our e-commerce platform. Proficient in Python, Go, or similar languages and experienced with cloud infrastructure.",
    ),
    (
        "job02",
        2,
        "Product Designer, UX/UI",
        "Mumbai, MH",
        "Design",
        "Full-time",
        "Create intuitive and beautiful user experiences across our web and mobile applications. Strong portfolio in UX research and visual design required.",
    ),
    (
        "job03",
        3,
        "Data Scientist, Supply Chain",
        "Bengaluru, KA",
        "Data Science",
        "Full-time",
        "Leverage data to optimize our supply chain, forecast demand, and improve logistics. Expertise in machine learning models and statistical analysis is essential.",
    ),
    (
        "job04",
        4,
        "Digital Marketing Manager",
        "Remote",
        "Marketing",
        "Full-time",
        "Lead our digital marketing campaigns across SEO, SEM, and social media channels to drive growth and brand awareness.",
    ),
    (
        "job05",
        5,
        "Textile Sourcing Specialist",
        "Coimbatore, TN",
        "Operations",
        "Full-time",
        "Identify and build relationships with textile suppliers, ensuring quality and sustainability standards are met. Deep knowledge of fabrics is a must.",
    ),
    (
        "job06",
        6,
        "Customer Support Associate",
        "Chennai, TN",
        "Customer Service",
        "Part-time",
        "Be the voice of Nila by providing exceptional support to our customers via email, chat, and phone. Excellent communication skills are key.",
    ),
    (
        "job07",
        7,
        "Frontend Developer Intern",
        "Bengaluru, KA",
        "Engineering",
        "Internship",
        "Join our frontend team to build and improve user-facing features. Gain hands-on experience with modern JavaScript frameworks like React or Vue.",
    ),
    (
        "job08",
        8,
        "Finance Analyst",
        "Mumbai, MH",
        "Finance",
        "Full-time",
        "Analyze financial data, prepare reports, and assist in budgeting and forecasting to support strategic business decisions.",
    ),
];

const OFFICES: [(&str, &str, &str, &str); 6] = [
    ("loc01", "Chennai, TN", "Corporate Office", "123 NILA Towers, Anna Salai, Chennai, 600002"),
    ("loc02", "Mumbai, MH", "Showroom & Office", "456 Silk Route, Bandra West, Mumbai, 400050"),
    ("loc03", "Bengaluru, KA", "Technology Hub", "789 Tech Park, Koramagala, Bengaluru, 560095"),
    ("loc04", "Coimbatore, TN", "Sourcing & Operations", "101 Cotton Avenue, Gandhipuram, Coimbatore, 641012"),
    ("loc05", "New York, USA", "International Office", "5th Avenue, New York, NY 10016, United States"),
    ("loc06", "London, UK", "European Showroom", "Regent Street, London W1B 5AP, United Kingdom"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;

    let products = seed_products(&pool).await?;
    let (jobs, offices) = seed_careers(&pool).await?;

    let admin_email =
        std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let admin_phone =
        std::env::var("SEED_ADMIN_PHONE").unwrap_or_else(|_| "9000000000".to_string());
    let admin_key = ensure_admin(&pool, &admin_email, &admin_phone).await?;

    println!(
        "Seed completed. Products added: {products}, jobs added: {jobs}, offices added: {offices}, admin: {admin_key}"
    );
    Ok(())
}

async fn seed_products(pool: &DbPool) -> anyhow::Result<u64> {
    let mut inserted = 0;
    for p in &PRODUCTS {
        inserted += sqlx::query(
            r#"
            INSERT INTO products (id, name, price, stock, image, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(p.id)
        .bind(p.name)
        .bind(p.price)
        .bind(p.stock)
        .bind(p.image)
        .bind(p.description)
        .execute(pool)
        .await?
        .rows_affected();
    }
    Ok(inserted)
}

async fn seed_careers(pool: &DbPool) -> anyhow::Result<(u64, u64)> {
    let mut jobs = 0;
    for (id, number, title, location, category, kind, description) in JOBS {
        jobs += sqlx::query(
            r#"
            INSERT INTO jobs (id, number, title, location, category, employment_type, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(number)
        .bind(title)
        .bind(location)
        .bind(category)
        .bind(kind)
        .bind(description)
        .execute(pool)
        .await?
        .rows_affected();
    }

    let mut offices = 0;
    for (id, city, kind, address) in OFFICES {
        offices += sqlx::query(
            r#"
            INSERT INTO offices (id, city, office_type, address)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(city)
        .bind(kind)
        .bind(address)
        .execute(pool)
        .await?
        .rows_affected();
    }

    Ok((jobs, offices))
}

async fn ensure_admin(pool: &DbPool, email: &str, phone: &str) -> anyhow::Result<String> {
    let key = user_key(email);
    sqlx::query(
        r#"
        INSERT INTO users (user_key, email, name, phone, organization, country, state, district, address, pincode, role)
        VALUES ($1, $2, 'NILA Admin', $3, 'NILA PRODUCTS', 'India', 'Tamil Nadu', 'Coimbatore', '14/1-1 Andal Avenue, Vellalore', '641111', 'admin')
        ON CONFLICT (user_key) DO UPDATE SET role = 'admin'
        "#,
    )
    .bind(&key)
    .bind(email)
    .bind(phone)
    .execute(pool)
    .await?;
    Ok(key)
}
