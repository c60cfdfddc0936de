//! Тесты: нормализация имён, машина состояний, выделение портов,
//! протокол checkin, интеграционные тесты HTTP.

#[cfg(test)]
mod tests {
    use crate::services::registry_service::{normalize_name, sshkey_fingerprint};
    use mesh_entities::nodes::NodeState;

    // ── Нормализация имён ─────────────────────────────────────────────────────

    #[test]
    fn test_normalize_name_collapses_separators() {
        assert_eq!(normalize_name("Site A, B"), "site_a_b");
        assert_eq!(normalize_name("Field West"), "field_west");
        assert_eq!(normalize_name("a,b"), "a_b");
        assert_eq!(normalize_name("A, B, C"), "a_b_c");
    }

    #[test]
    fn test_normalize_name_keeps_normalized_input() {
        assert_eq!(normalize_name("site_a_b"), "site_a_b");
        assert_eq!(normalize_name(""), "");
    }

    // ── Отпечаток ключа ───────────────────────────────────────────────────────

    #[test]
    fn test_sshkey_fingerprint_known_value() {
        // md5("AAAA")
        assert_eq!(
            sshkey_fingerprint("AAAA"),
            "098890dde069e9abad63f19a0d9e1f32"
        );
    }

    #[test]
    fn test_sshkey_fingerprint_is_lowercase_hex() {
        let digest = sshkey_fingerprint("ssh-rsa AAAA mango@node");
        assert_eq!(digest.len(), 32);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, digest.to_lowercase());
        assert_eq!(digest, "3ecf1923cffcdc605011b0386c79f7c5");
    }

    // ── Машина состояний ──────────────────────────────────────────────────────

    #[test]
    fn test_node_state_round_trip() {
        for state in [
            NodeState::Pending,
            NodeState::ApprovedInactive,
            NodeState::Active,
        ] {
            let (pending, active) = state.flags();
            assert_eq!(
                NodeState::from_flags(pending, active),
                Some(state),
                "Состояние должно восстанавливаться из своих флагов"
            );
        }
    }

    #[test]
    fn test_node_state_rejects_illegal_combination() {
        assert_eq!(
            NodeState::from_flags(true, true),
            None,
            "Пара pending && active недопустима"
        );
    }

    // ── Пароль администратора ─────────────────────────────────────────────────

    #[test]
    fn test_password_hash_and_verify() {
        use crate::config::{hash_password, verify_password};

        let password = "SuperSecret123!";
        let hash = hash_password(password);

        assert!(
            verify_password(password, &hash),
            "Верный пароль должен проходить проверку"
        );
        assert!(
            !verify_password("WrongPassword", &hash),
            "Неверный пароль должен отклоняться"
        );
    }

    // ── Сервисные тесты реестра ───────────────────────────────────────────────

    mod registry {
        use crate::error::AppError;
        use crate::services::group_service::{self, CreateGroupData, UpdateGroupData};
        use crate::services::registry_service::{self, PatchData, RegisterData};
        use crate::services::admin_service;
        use mesh_migration::{Migrator, MigratorTrait};
        use sea_orm::{Database, DatabaseConnection};

        async fn setup_db() -> DatabaseConnection {
            let db = Database::connect("sqlite::memory:").await.unwrap();
            Migrator::up(&db, None).await.unwrap();
            db
        }

        async fn seed_group(db: &DatabaseConnection, name: &str) {
            group_service::create_group(
                db,
                CreateGroupData {
                    name: name.to_string(),
                    label: None,
                    ssh_user: Some("tunnel".to_string()),
                    ssh_host: Some("gw.example.org".to_string()),
                    ssh_port: Some(2022),
                },
            )
            .await
            .unwrap();
        }

        fn register_data(group: &str, uuid: &str) -> RegisterData {
            RegisterData {
                group: group.to_string(),
                uuid: uuid.to_string(),
                sshkey: None,
                name: None,
            }
        }

        #[tokio::test]
        async fn test_register_assigns_sequential_ports() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;

            let first = registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();
            assert!(first.pending);
            assert!(!first.active);
            assert_eq!(first.ssh_port, 2200);
            assert_eq!(first.ssh_port_alt, 2201);

            let second = registry_service::register(&db, register_data("g1", "u2"))
                .await
                .unwrap();
            assert_eq!(second.ssh_port, 2202);
            assert_eq!(second.ssh_port_alt, 2203);
        }

        #[tokio::test]
        async fn test_register_is_idempotent_while_pending() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;

            let first = registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();

            let mut retry = register_data("g1", "u1");
            retry.name = Some("Site A, B".to_string());
            retry.sshkey = Some("ssh-rsa AAAA mango@node".to_string());
            let second = registry_service::register(&db, retry).await.unwrap();

            // Та же запись, те же порты, обновлённые поля
            assert_eq!(second.id, first.id);
            assert_eq!(second.ssh_port, first.ssh_port);
            assert_eq!(second.ssh_port_alt, first.ssh_port_alt);
            assert_eq!(second.name, "site_a_b");
            assert_eq!(second.sshkey, "ssh-rsa AAAA mango@node");
            assert!(second.pending);

            let all = registry_service::list_nodes(&db).await.unwrap();
            assert_eq!(all.len(), 1, "Повторная регистрация не создаёт узлов");

            // Порты при повторе не расходуются: следующий узел берёт 2202
            let next = registry_service::register(&db, register_data("g1", "u2"))
                .await
                .unwrap();
            assert_eq!(next.ssh_port, 2202);
        }

        #[tokio::test]
        async fn test_register_conflict_when_already_approved() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;

            registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();
            registry_service::approve(&db, "u1").await.unwrap();

            let err = registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap_err();
            assert!(
                matches!(err, AppError::Conflict(_)),
                "Регистрация поверх подтверждённого узла должна отклоняться"
            );
        }

        #[tokio::test]
        async fn test_register_unknown_group() {
            let db = setup_db().await;

            let err = registry_service::register(&db, register_data("nope", "u1"))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)));
        }

        #[tokio::test]
        async fn test_approve_only_from_pending() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;
            registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();

            let node = registry_service::approve(&db, "u1").await.unwrap();
            assert!(!node.pending);
            assert!(node.active);

            let err = registry_service::approve(&db, "u1").await.unwrap_err();
            assert!(
                matches!(err, AppError::Conflict(_)),
                "Повторное подтверждение должно отклоняться"
            );
        }

        #[tokio::test]
        async fn test_enable_disable_cycle() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;
            registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();
            registry_service::approve(&db, "u1").await.unwrap();

            let node = registry_service::disable(&db, "u1").await.unwrap();
            assert!(!node.active);
            assert!(!node.pending);

            let node = registry_service::enable(&db, "u1").await.unwrap();
            assert!(node.active);
            assert!(!node.pending);
        }

        #[tokio::test]
        async fn test_disable_keeps_pending_node_pending() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;
            registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();

            let node = registry_service::disable(&db, "u1").await.unwrap();
            assert!(node.pending);
            assert!(!node.active);
        }

        #[tokio::test]
        async fn test_active_never_combined_with_pending() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;
            registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();

            // Инвариант active => !pending через все переходы
            for node in [
                registry_service::approve(&db, "u1").await.unwrap(),
                registry_service::disable(&db, "u1").await.unwrap(),
                registry_service::enable(&db, "u1").await.unwrap(),
                registry_service::patch(
                    &db,
                    "u1",
                    PatchData {
                        sshkey: Some("new-key".to_string()),
                        ..PatchData::default()
                    },
                )
                .await
                .unwrap(),
                registry_service::enable(&db, "u1").await.unwrap(),
            ] {
                assert!(
                    !(node.pending && node.active),
                    "Недопустимая комбинация pending && active"
                );
            }
        }

        #[tokio::test]
        async fn test_key_rotation_resets_to_pending() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;
            registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();
            registry_service::approve(&db, "u1").await.unwrap();

            let node = registry_service::patch(
                &db,
                "u1",
                PatchData {
                    sshkey: Some("ssh-ed25519 BBBB mango@node".to_string()),
                    ..PatchData::default()
                },
            )
            .await
            .unwrap();

            assert!(node.pending, "Новый ключ требует повторного подтверждения");
            assert!(!node.active);
            assert_eq!(node.sshkey, "ssh-ed25519 BBBB mango@node");
        }

        #[tokio::test]
        async fn test_patch_normalizes_name_and_keeps_state() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;
            registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();
            registry_service::approve(&db, "u1").await.unwrap();

            let node = registry_service::patch(
                &db,
                "u1",
                PatchData {
                    name: Some("Site A, B".to_string()),
                    ..PatchData::default()
                },
            )
            .await
            .unwrap();

            assert_eq!(node.name, "site_a_b");
            assert!(node.active, "Правка имени не меняет состояние");
        }

        #[tokio::test]
        async fn test_checkin_pending_payload_is_exact() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;
            registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();

            let response = registry_service::checkin(&db, "u1").await.unwrap();
            let value = serde_json::to_value(&response).unwrap();

            assert_eq!(
                value,
                serde_json::json!({ "pending": true }),
                "Ожидающий узел получает ровно одно поле"
            );
        }

        #[tokio::test]
        async fn test_checkin_active_payload() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;

            let mut data = register_data("g1", "u1");
            data.sshkey = Some("AAAA".to_string());
            data.name = Some("node one".to_string());
            registry_service::register(&db, data).await.unwrap();
            registry_service::approve(&db, "u1").await.unwrap();

            let response = registry_service::checkin(&db, "u1").await.unwrap();
            let value = serde_json::to_value(&response).unwrap();

            assert_eq!(value["pending"], false);
            assert_eq!(value["active"], true);
            assert_eq!(value["update"], false);
            assert_eq!(value["name"], "node_one");
            assert_eq!(value["ssh_port"], 2200);
            assert_eq!(value["ssh_port_alt"], 2201);
            assert_eq!(value["ssh_host"], "gw.example.org");
            assert_eq!(value["ssh_host_port"], 2022);
            assert_eq!(value["ssh_user"], "tunnel");
            assert_eq!(value["sshkey_md5"], "098890dde069e9abad63f19a0d9e1f32");

            // Координаты не заданы и не сериализуются вовсе
            assert!(value.get("latitude").is_none());
            assert!(value.get("longitude").is_none());
        }

        #[tokio::test]
        async fn test_checkin_omits_fingerprint_without_key() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;
            registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();
            registry_service::approve(&db, "u1").await.unwrap();

            let response = registry_service::checkin(&db, "u1").await.unwrap();
            let value = serde_json::to_value(&response).unwrap();

            assert!(value.get("sshkey_md5").is_none());
        }

        #[tokio::test]
        async fn test_checkin_includes_location_when_both_set() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;
            registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();
            registry_service::approve(&db, "u1").await.unwrap();

            registry_service::patch(
                &db,
                "u1",
                PatchData {
                    latitude: Some(65.13),
                    longitude: Some(-147.48),
                    ..PatchData::default()
                },
            )
            .await
            .unwrap();

            let response = registry_service::checkin(&db, "u1").await.unwrap();
            let value = serde_json::to_value(&response).unwrap();

            assert_eq!(value["latitude"], 65.13);
            assert_eq!(value["longitude"], -147.48);
        }

        #[tokio::test]
        async fn test_checkin_advances_checked_on() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;
            let node = registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();

            registry_service::checkin(&db, "u1").await.unwrap();
            let after = registry_service::lookup_node(&db, "u1").await.unwrap();

            assert!(
                after.checked_on >= node.checked_on,
                "checked_on не убывает"
            );
        }

        #[tokio::test]
        async fn test_replace_uuid_takes_over_stale_registration() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;

            let original = registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();
            registry_service::approve(&db, "u1").await.unwrap();

            // Перепрошитое устройство зарегистрировалось заново с новым UUID
            registry_service::register(&db, register_data("g1", "u2"))
                .await
                .unwrap();

            let node = registry_service::replace_uuid(&db, "u1", "u2").await.unwrap();

            assert_eq!(node.uuid, "u2");
            assert_eq!(node.id, original.id);
            assert_eq!(node.ssh_port, original.ssh_port);
            assert_eq!(node.ssh_port_alt, original.ssh_port_alt);

            let all = registry_service::list_nodes(&db).await.unwrap();
            assert_eq!(all.len(), 1, "Устаревшая регистрация удалена");
        }

        #[tokio::test]
        async fn test_replace_uuid_rejects_approved_collision() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;

            registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();
            registry_service::register(&db, register_data("g1", "u2"))
                .await
                .unwrap();
            registry_service::approve(&db, "u2").await.unwrap();

            let err = registry_service::replace_uuid(&db, "u1", "u2")
                .await
                .unwrap_err();
            assert!(
                matches!(err, AppError::Conflict(_)),
                "Столкновение с подтверждённым узлом недопустимо"
            );
        }

        #[tokio::test]
        async fn test_group_delete_refused_while_nodes_reference_it() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;
            registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();

            let err = group_service::delete_group(&db, "g1").await.unwrap_err();
            assert!(matches!(err, AppError::Conflict(_)));

            registry_service::delete_node(&db, "u1").await.unwrap();
            group_service::delete_group(&db, "g1").await.unwrap();
        }

        #[tokio::test]
        async fn test_group_duplicate_name_rejected() {
            let db = setup_db().await;
            seed_group(&db, "Field West").await;

            let err = group_service::create_group(
                &db,
                CreateGroupData {
                    name: "field_west".to_string(),
                    label: None,
                    ssh_user: None,
                    ssh_host: None,
                    ssh_port: None,
                },
            )
            .await
            .unwrap_err();

            assert!(
                matches!(err, AppError::AlreadyExists(_)),
                "Имена групп сравниваются после нормализации"
            );
        }

        #[tokio::test]
        async fn test_group_update_is_partial() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;

            let group = group_service::update_group(
                &db,
                "g1",
                UpdateGroupData {
                    ssh_host: Some("gw2.example.org".to_string()),
                    ..UpdateGroupData::default()
                },
            )
            .await
            .unwrap();

            assert_eq!(group.ssh_host, "gw2.example.org");
            assert_eq!(group.ssh_user, "tunnel", "Прочие поля не трогаются");
            assert_eq!(group.ssh_port, 2022);
        }

        #[tokio::test]
        async fn test_sshkeys_only_from_active_nodes() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;

            let mut with_key = register_data("g1", "u1");
            with_key.sshkey = Some("key-one".to_string());
            registry_service::register(&db, with_key).await.unwrap();
            registry_service::approve(&db, "u1").await.unwrap();

            // Ожидающий узел с ключом и активный узел без ключа не попадают
            let mut pending = register_data("g1", "u2");
            pending.sshkey = Some("key-two".to_string());
            registry_service::register(&db, pending).await.unwrap();

            registry_service::register(&db, register_data("g1", "u3"))
                .await
                .unwrap();
            registry_service::approve(&db, "u3").await.unwrap();

            let keys = registry_service::sshkeys_by_group(&db, "g1").await.unwrap();
            assert_eq!(keys, vec!["key-one".to_string()]);

            let by_user = registry_service::sshkeys_by_user(&db, "tunnel").await.unwrap();
            assert_eq!(by_user, vec!["key-one".to_string()]);
        }

        #[tokio::test]
        async fn test_stats_counts() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;

            registry_service::register(&db, register_data("g1", "u1"))
                .await
                .unwrap();
            registry_service::register(&db, register_data("g1", "u2"))
                .await
                .unwrap();
            registry_service::approve(&db, "u1").await.unwrap();

            let stats = admin_service::get_stats(&db).await.unwrap();
            assert_eq!(stats.nodes, 2);
            assert_eq!(stats.pending, 1);
            assert_eq!(stats.active, 1);
            assert_eq!(stats.groups, 1);
        }

        #[tokio::test]
        async fn test_concurrent_registrations_get_distinct_ports() {
            let db = setup_db().await;
            seed_group(&db, "g1").await;

            let mut tasks = tokio::task::JoinSet::new();
            for i in 0..6 {
                let db = db.clone();
                tasks.spawn(async move {
                    registry_service::register(&db, register_data("g1", &format!("u{i}"))).await
                });
            }

            while let Some(result) = tasks.join_next().await {
                result.unwrap().unwrap();
            }

            let all = registry_service::list_nodes(&db).await.unwrap();
            assert_eq!(all.len(), 6);

            let mut ports: Vec<i32> = all
                .iter()
                .flat_map(|n| [n.ssh_port, n.ssh_port_alt])
                .collect();
            ports.sort();
            ports.dedup();
            assert_eq!(ports.len(), 12, "Порты не должны повторяться");
            assert!(ports.iter().all(|p| (2200..2212).contains(p)));
        }
    }

    // ── HTTP интеграционные тесты ─────────────────────────────────────────────

    mod integration {
        use axum::body::Body;
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt;

        const TEST_API_KEY: &str = "test-device-key";

        async fn build_test_app() -> (axum::Router, sea_orm::DatabaseConnection) {
            use crate::api::{build_router, rate_limit::RateLimiter, AppState};
            use crate::config::hash_password;
            use mesh_migration::{Migrator, MigratorTrait};
            use sea_orm::Database;

            let db = Database::connect("sqlite::memory:").await.unwrap();
            Migrator::up(&db, None).await.unwrap();

            let state = AppState {
                db: db.clone(),
                jwt_secret: "test-secret".to_string(),
                admin_username: "admin".to_string(),
                admin_password_hash: hash_password("admin123"),
                api_key: TEST_API_KEY.to_string(),
                rate_limiter: RateLimiter::new(1000, 60),
            };

            (build_router(state), db)
        }

        async fn seed_group(db: &sea_orm::DatabaseConnection) {
            use crate::services::group_service::{self, CreateGroupData};

            group_service::create_group(
                db,
                CreateGroupData {
                    name: "g1".to_string(),
                    label: None,
                    ssh_user: Some("tunnel".to_string()),
                    ssh_host: Some("gw.example.org".to_string()),
                    ssh_port: None,
                },
            )
            .await
            .unwrap();
        }

        async fn admin_token(app: &axum::Router) -> String {
            let body = serde_json::json!({ "username": "admin", "password": "admin123" });
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/auth/login")
                        .header("content-type", "application/json")
                        .body(Body::from(body.to_string()))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            value["token"].as_str().unwrap().to_string()
        }

        #[tokio::test]
        async fn test_health_check() {
            let (app, _db) = build_test_app().await;

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/health")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
        }

        #[tokio::test]
        async fn test_register_requires_api_key() {
            let (app, db) = build_test_app().await;
            seed_group(&db).await;

            let body = serde_json::json!({ "group": "g1", "uuid": "u1" });
            let response = app
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/v1/nodes")
                        .header("content-type", "application/json")
                        .body(Body::from(body.to_string()))
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn test_register_approve_checkin_flow() {
            let (app, db) = build_test_app().await;
            seed_group(&db).await;

            // Регистрация с API-ключом
            let body = serde_json::json!({
                "group": "g1",
                "uuid": "u1",
                "sshkey": "AAAA",
                "name": "Node One"
            });
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/v1/nodes")
                        .header("content-type", "application/json")
                        .header("MESH-APIKEY", TEST_API_KEY)
                        .body(Body::from(body.to_string()))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);

            // До подтверждения checkin отвечает только pending
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/v1/nodes/u1/checkin")
                        .header("MESH-APIKEY", TEST_API_KEY)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(value, serde_json::json!({ "pending": true }));

            // Подтверждение администратором
            let token = admin_token(&app).await;
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/v1/nodes/u1/approve")
                        .header("Authorization", format!("Bearer {token}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);

            // Подтверждённый узел получает конфигурацию туннеля
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/v1/nodes/u1/checkin")
                        .header("MESH-APIKEY", TEST_API_KEY)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

            assert_eq!(value["pending"], false);
            assert_eq!(value["active"], true);
            assert_eq!(value["ssh_port"], 2200);
            assert_eq!(value["ssh_port_alt"], 2201);
            assert_eq!(value["ssh_host"], "gw.example.org");
            assert_eq!(value["ssh_user"], "tunnel");
            assert_eq!(value["sshkey_md5"], "098890dde069e9abad63f19a0d9e1f32");
        }

        #[tokio::test]
        async fn test_approve_requires_admin_token() {
            let (app, db) = build_test_app().await;
            seed_group(&db).await;

            let response = app
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/v1/nodes/u1/approve")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn test_group_create_requires_admin_token() {
            let (app, _db) = build_test_app().await;

            let body = serde_json::json!({ "name": "g1" });
            let response = app
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/v1/groups")
                        .header("content-type", "application/json")
                        .body(Body::from(body.to_string()))
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn test_admin_stats() {
            let (app, db) = build_test_app().await;
            seed_group(&db).await;

            let token = admin_token(&app).await;
            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/api/v1/admin/stats")
                        .header("Authorization", format!("Bearer {token}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(value["groups"], 1);
            assert_eq!(value["nodes"], 0);
        }
    }
}
