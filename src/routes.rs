use crate::{
    api::{attendance, duty, employee, request, schedule, site, stats},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/check-in").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    )
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(web::resource("/history").route(web::get().to(attendance::history))),
            )
            .service(
                web::scope("/site")
                    // /site
                    .service(
                        web::resource("")
                            .route(web::post().to(site::create_site))
                            .route(web::get().to(site::list_sites)),
                    )
                    // /site/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(site::get_site))
                            .route(web::put().to(site::update_site)),
                    ),
            )
            .service(
                web::scope("/schedule")
                    .service(web::resource("").route(web::get().to(schedule::get_schedule)))
                    .service(
                        web::resource("/{weekday}")
                            .route(web::put().to(schedule::update_schedule)),
                    ),
            )
            .service(
                web::scope("/holiday").service(
                    web::resource("")
                        .route(web::get().to(schedule::list_holidays))
                        .route(web::post().to(schedule::create_holiday)),
                ),
            )
            .service(
                web::scope("/request")
                    // /request
                    .service(
                        web::resource("")
                            .route(web::get().to(request::request_list))
                            .route(web::post().to(request::create_request)),
                    )
                    // /request/{id}
                    .service(
                        web::resource("/{id}").route(web::get().to(request::get_request)),
                    )
                    // /request/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(request::approve_request)),
                    )
                    // /request/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(request::reject_request)),
                    ),
            )
            .service(
                web::scope("/duty")
                    .service(web::resource("").route(web::get().to(duty::duty_list)))
                    .service(web::resource("/{id}").route(web::get().to(duty::duty_detail)))
                    .service(
                        web::resource("/{duty_id}/member/{member_id}/approve")
                            .route(web::put().to(duty::approve_member)),
                    )
                    .service(
                        web::resource("/{duty_id}/member/{member_id}/reject")
                            .route(web::put().to(duty::reject_member)),
                    ),
            )
            .service(
                web::scope("/stats")
                    .service(
                        web::resource("/requests").route(web::get().to(stats::request_counters)),
                    )
                    .service(web::resource("/duty").route(web::get().to(stats::duty_counters))),
            )
            .service(
                web::scope("/employee")
                    .service(web::resource("").route(web::get().to(employee::list_employees)))
                    .service(
                        web::resource("/{id}").route(web::get().to(employee::get_employee)),
                    ),
            ),
    );
}
