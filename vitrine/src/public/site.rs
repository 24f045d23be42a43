// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::meta::PagePath;

/// The public routes of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SitePage {
    Home,
    Services,
    About,
    Contact,
    Projects,
}

impl SitePage {
    pub const ALL: [SitePage; 5] = [
        SitePage::Home,
        SitePage::Services,
        SitePage::About,
        SitePage::Contact,
        SitePage::Projects,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            SitePage::Home => "/",
            SitePage::Services => "/services",
            SitePage::About => "/about",
            SitePage::Contact => "/contact",
            SitePage::Projects => "/projects",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SitePage::Home => "Home",
            SitePage::Services => "Services",
            SitePage::About => "About",
            SitePage::Contact => "Contact",
            SitePage::Projects => "Projects",
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            SitePage::Home => "public/home.html",
            SitePage::Services => "public/services.html",
            SitePage::About => "public/about.html",
            SitePage::Contact => "public/contact.html",
            SitePage::Projects => "public/projects.html",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            SitePage::Home => "Websites and digital products that perform",
            SitePage::Services => "Services",
            SitePage::About => "About us",
            SitePage::Contact => "Contact",
            SitePage::Projects => "Projects",
        }
    }

    pub fn intro(&self) -> &'static str {
        match self {
            SitePage::Home => {
                "We are a small studio that designs, builds and looks after websites and web applications."
            }
            SitePage::Services => "From the first sketch to the hundredth deploy, we cover the whole lifecycle.",
            SitePage::About => {
                "A distributed team of designers and engineers who prefer shipping to slide decks."
            }
            SitePage::Contact => "Tell us about your project and we will get back to you.",
            SitePage::Projects => "A selection of recent work for clients large and small.",
        }
    }

    pub fn highlights(&self) -> &'static [&'static str] {
        match self {
            SitePage::Home => &["Strategy and UX", "Engineering", "Search visibility"],
            SitePage::Services => &[
                "Web development",
                "Mobile applications",
                "UI and UX design",
                "SEO and performance audits",
                "Hosting and maintenance",
            ],
            SitePage::About => &["Founded in 2016", "Twelve people across four time zones"],
            SitePage::Contact => &[],
            SitePage::Projects => &[
                "Booking platform for a regional theatre",
                "E-commerce rebuild for an outdoor retailer",
                "Analytics dashboard for a logistics startup",
            ],
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, SitePage::Home)
    }

    pub fn page_path(&self) -> PagePath {
        PagePath::parse(self.path())
    }

    /// Finds the page for a request path, tolerating a trailing slash.
    pub fn from_path(path: &str) -> Option<SitePage> {
        let normalized = PagePath::parse(path);
        Self::ALL
            .into_iter()
            .find(|page| page.path() == normalized.as_str())
    }

    /// True when a route mounted at `prefix` would hide this page.
    pub fn shadowed_by(&self, prefix: &str) -> bool {
        if self.is_root() {
            return false;
        }
        let prefix = prefix.trim_end_matches('/');
        prefix == self.path() || prefix.starts_with(&format!("{}/", self.path()))
    }
}
