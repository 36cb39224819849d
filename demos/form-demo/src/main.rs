use std::path::Path;

use forma_core::{format_errors, FormConfig, DEFAULT_ENV_PREFIX};
use forma_state::prelude::*;
use forma_validator::{validate_data_using_schema, DerivedSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

// ==================== 服务端模式 ====================

#[derive(Debug, Deserialize, Serialize, Validate)]
struct SignupRequest {
    #[validate(length(min = 3, message = "Name must be at least 3 characters"))]
    name: String,

    #[validate(email(message = "Email must be a valid email address"))]
    email: String,

    #[validate(range(min = 18, max = 120, message = "Age must be between 18 and 120"))]
    age: u32,
}

/// 模拟服务端：邮箱已被占用时返回 422 风格的错误载荷
async fn fake_server(data: Value) -> Result<String, SubmitError> {
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    if data["email"] == "taken@example.com" {
        return Err(SubmitError::rejected(
            "Request failed with status code 422",
            json!({
                "response": {
                    "status": 422,
                    "data": {
                        "errors": { "email": ["This email is already registered"] }
                    }
                }
            }),
        ));
    }

    Ok(format!("user-{}", data["name"].as_str().unwrap_or_default()))
}

fn load_config() -> anyhow::Result<FormConfig> {
    let config_paths = ["demos/form-demo/form.toml", "form.toml"];

    let config = match config_paths.iter().find(|path| Path::new(path).exists()) {
        Some(path) => FormConfig::from_file(path)?,
        None => FormConfig::default(),
    };

    Ok(config.with_env_overrides(DEFAULT_ENV_PREFIX)?)
}

fn print_errors(title: &str, errors: &Errors) {
    println!("\n{title}");
    if errors.any() {
        print!("{}", format_errors(errors, 3));
    } else {
        println!("   (no errors)");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("\n╔════════════════════════════════════════════════════╗");
    println!("║           Forma - Form State Demo                  ║");
    println!("╚════════════════════════════════════════════════════╝");

    let config = load_config()?;
    config.logging.clone().with_env().init()?;

    let form = Form::new(json!({
        "name": "",
        "email": "",
        "age": null,
        "address": { "city": "", "zipCode": "" },
    }))?
    .with_config(config.clone())
    .with_rules(rules! {
        "name" => [builtin::required(), builtin::length(Some(3), Some(40))],
        "email" => [builtin::required(), builtin::email()],
        "age" => [builtin::required(), builtin::range(Some(18.0), Some(120.0))],
        "address" => {
            "city" => [builtin::required()],
            "zipCode" => [builtin::pattern(r"^\d{4,5}$")?],
        },
    });

    form.subscribe(|event: &FormEvent| {
        tracing::info!("form event: {:?}", event);
    });

    // 逐字段编辑
    let fields = form.fields(None)?;
    if let Some(name) = fields.get("name") {
        name.set_value("Jo")?;
        println!("\n✏️  name = {:?}, error = {:?}", name.value(), name.error());
    }

    let city = form.field("address.city")?;
    city.set_value("")?;
    println!("✏️  address.city error = {:?}", city.error());
    println!("   address has errors: {}", form.field("address")?.has_error());

    // 校验失败时不会调用处理函数
    let outcome = form.submit(fake_server, form.submit_options()).await?;
    println!("\n🚫 First submit: {:?}", outcome);
    print_errors("📋 Errors after validation:", &form.errors());

    // 修正后提交，服务端拒绝邮箱
    if let Value::Object(corrected) = json!({
        "name": "Joan",
        "email": "taken@example.com",
        "age": 30,
        "address": { "city": "Riga", "zipCode": "1050" },
    }) {
        form.update_data(&corrected);
    }
    println!("\n🔄 Has changes: {}", form.has_changes());

    match form.submit(fake_server, form.submit_options()).await {
        Ok(outcome) => println!("\n✅ Second submit: {:?}", outcome),
        Err(error) => println!("\n❌ Second submit failed:\n{error}"),
    }
    print_errors("📋 Errors reconciled from the server:", &form.errors());

    // 换一个邮箱后提交成功
    form.field("email")?.set_value("joan@example.com")?;
    let outcome = form
        .submit(fake_server, form.submit_options().reset_on_success(true))
        .await?;
    println!("\n✅ Third submit: {:?}", outcome);
    println!("   sent = {}, loading = {}", form.is_sent(), form.is_loading());
    println!("   data after reset = {}", form.data());

    // 服务端用派生模式校验同一份数据
    println!("\n╔════════════════════════════════════════════════════╗");
    println!("║           Server-side schema validation            ║");
    println!("╚════════════════════════════════════════════════════╝");

    let schema = DerivedSchema::<SignupRequest>::new();
    let request = json!({ "name": "Al", "email": "nope", "age": 12 });

    match validate_data_using_schema(&request, &schema, Some(config.validation.message.as_str())) {
        Ok(parsed) => println!("\n✅ Request accepted: {parsed}"),
        Err(error) => println!("\n❌ {error}"),
    }

    Ok(())
}
