// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod admin_api_test;
pub mod helpers;
pub mod http_scraper_test;
pub mod scheduler_chain_test;
