use crate::{
    api::{account, attendance, dashboard, employee},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter config
    fn build_limiter(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    let login_limiter = build_limiter(config.rate_login_per_min);
    let accounts_limiter = build_limiter(config.rate_accounts_per_min);
    let refresh_limiter = build_limiter(config.rate_refresh_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&refresh_limiter))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
             // authentication
            .wrap(Governor::new(&protected_limiter)) // rate limiting
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{employee_id}/photo
                    .service(
                        web::resource("/{employee_id}/photo")
                            .route(web::get().to(employee::get_employee_photo))
                            .route(web::put().to(employee::set_employee_photo)),
                    )
                    // /employees/{employee_id}
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/accounts")
                    // /accounts
                    .service(
                        web::resource("")
                            .wrap(Governor::new(&accounts_limiter))
                            .route(web::post().to(account::create_account)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance/today
                    .service(
                        web::resource("/today")
                            .route(web::post().to(attendance::ensure_today)),
                    )
                    // /attendance/time-in
                    .service(
                        web::resource("/time-in")
                            .route(web::post().to(attendance::time_in)),
                    )
                    // /attendance/time-out
                    .service(
                        web::resource("/time-out")
                            .route(web::post().to(attendance::time_out)),
                    )
                    // /attendance/summary
                    .service(
                        web::resource("/summary")
                            .route(web::get().to(attendance::monthly_summary)),
                    )
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::get().to(attendance::list_attendance)),
                    ),
            )
            .service(
                web::scope("/dashboard")
                    // /dashboard/stats
                    .service(
                        web::resource("/stats")
                            .route(web::get().to(dashboard::stats)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
